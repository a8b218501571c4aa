use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use explorer_core::Payload;
use explorer_logging::{explorer_debug, explorer_warn};

use crate::storage::KeyValueStore;

pub const PAYLOAD_KEY_PREFIX: &str = "game_payload_";

pub fn payload_key(document_id: &str) -> String {
    format!("{PAYLOAD_KEY_PREFIX}{document_id}")
}

/// Session-scoped payloads keyed by document id. Reads and writes are
/// best-effort; failures only cost a refetch.
#[derive(Clone)]
pub struct PayloadCache {
    store: Arc<dyn KeyValueStore>,
    epoch: Arc<AtomicU64>,
}

impl PayloadCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            epoch: Arc::default(),
        }
    }

    /// Bumped by every [`PayloadCache::clear`]; shared by all clones.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Stores only if no clear happened since `epoch` was read.
    pub fn put_in_epoch(&self, epoch: u64, document_id: &str, payload: &Payload) -> bool {
        if epoch != self.epoch() {
            explorer_debug!("payload cache: dropping late write of {}", payload_key(document_id));
            return false;
        }
        self.put(document_id, payload)
    }

    pub fn get(&self, document_id: &str) -> Option<Payload> {
        let key = payload_key(document_id);
        let text = match self.store.get(&key) {
            Ok(text) => text?,
            Err(err) => {
                explorer_warn!("payload cache: read of {} failed: {}", key, err);
                return None;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(Payload::from_value)
        {
            Some(payload) => Some(payload),
            None => {
                explorer_warn!("payload cache: dropping unreadable {}", key);
                self.remove(document_id);
                None
            }
        }
    }

    /// Returns whether the payload was stored.
    pub fn put(&self, document_id: &str, payload: &Payload) -> bool {
        let key = payload_key(document_id);
        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(err) => {
                explorer_warn!("payload cache: cannot serialize {}: {}", key, err);
                return false;
            }
        };
        match self.store.set(&key, &text) {
            Ok(()) => {
                explorer_debug!("payload cache: stored {}", key);
                true
            }
            Err(err) => {
                explorer_warn!("payload cache: {} not cached: {}", key, err);
                false
            }
        }
    }

    pub fn remove(&self, document_id: &str) {
        let key = payload_key(document_id);
        if let Err(err) = self.store.remove(&key) {
            explorer_warn!("payload cache: cannot remove {}: {}", key, err);
        }
    }

    /// Drops every payload entry; other keys in the store are left alone.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(err) => {
                explorer_warn!("payload cache: cannot list keys: {}", err);
                return;
            }
        };
        for key in keys.iter().filter(|key| key.starts_with(PAYLOAD_KEY_PREFIX)) {
            if let Err(err) = self.store.remove(key) {
                explorer_warn!("payload cache: cannot remove {}: {}", key, err);
            }
        }
    }
}
