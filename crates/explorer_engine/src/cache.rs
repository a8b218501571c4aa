//! Two-tier cache for listings.
//!
//! The durable tier holds metadata and child listings with a fixed TTL and
//! survives reloads. The session tier holds built tree levels without a TTL
//! and lives as long as the browsing session. Which tier an entry uses is
//! decided by its [`CacheKind`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use explorer_logging::{explorer_debug, explorer_warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::storage::{KeyValueStore, StorageError};

pub const CACHE_NAMESPACE: &str = "driveExplorer_v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Node metadata (durable).
    Metadata,
    /// Raw child listings (durable).
    Children,
    /// Built tree levels (session).
    Level,
}

impl CacheKind {
    const ALL: [CacheKind; 3] = [CacheKind::Metadata, CacheKind::Children, CacheKind::Level];

    fn prefix(self) -> &'static str {
        match self {
            CacheKind::Metadata => "meta",
            CacheKind::Children => "children",
            CacheKind::Level => "tree",
        }
    }

    fn is_durable(self) -> bool {
        !matches!(self, CacheKind::Level)
    }
}

/// Namespaced key: `driveExplorer_v1:<kind>:<id>`.
pub fn cache_key(kind: CacheKind, id: &str) -> String {
    format!("{CACHE_NAMESPACE}:{}:{id}", kind.prefix())
}

/// Other records share the namespace (the navigation snapshot does), so only
/// keys with a cache-kind prefix belong to the cache.
fn is_cache_key(key: &str) -> bool {
    CacheKind::ALL
        .iter()
        .any(|kind| key.starts_with(&cache_key(*kind, "")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub value: T,
}

impl<T> CacheEntry<T> {
    /// Valid iff `now - timestamp < ttl`; entries without a TTL never expire.
    pub fn is_valid(&self, now: i64, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => now.saturating_sub(self.timestamp) < ttl.as_millis() as i64,
            None => true,
        }
    }
}

struct CacheTier {
    name: &'static str,
    store: Arc<dyn KeyValueStore>,
    ttl: Option<Duration>,
}

impl CacheTier {
    fn namespaced_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| is_cache_key(key))
                .collect(),
            Err(err) => {
                explorer_warn!("{} cache: cannot list keys: {}", self.name, err);
                Vec::new()
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            explorer_warn!("{} cache: cannot remove {}: {}", self.name, key, err);
        }
    }

    fn evict_expired(&self, now: i64) -> usize {
        let mut evicted = 0;
        for key in self.namespaced_keys() {
            let keep = match self.store.get(&key) {
                Ok(Some(text)) => serde_json::from_str::<CacheEntry<serde_json::Value>>(&text)
                    .map(|entry| entry.is_valid(now, self.ttl))
                    .unwrap_or(false),
                Ok(None) => true,
                Err(_) => false,
            };
            if !keep {
                self.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }

    fn clear(&self) {
        for key in self.namespaced_keys() {
            self.remove(&key);
        }
    }
}

pub struct TieredCache {
    durable: CacheTier,
    session: CacheTier,
    clock: Arc<dyn Clock>,
    epoch: AtomicU64,
}

impl TieredCache {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        durable_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            durable: CacheTier {
                name: "durable",
                store: durable,
                ttl: Some(durable_ttl),
            },
            session: CacheTier {
                name: "session",
                store: session,
                ttl: None,
            },
            clock,
            epoch: AtomicU64::new(0),
        }
    }

    fn tier(&self, kind: CacheKind) -> &CacheTier {
        if kind.is_durable() {
            &self.durable
        } else {
            &self.session
        }
    }

    /// Returns the cached value, treating expired or corrupt entries as absent
    /// and removing them on the spot.
    pub fn get<T: DeserializeOwned>(&self, kind: CacheKind, id: &str) -> Option<T> {
        let tier = self.tier(kind);
        let key = cache_key(kind, id);
        let text = match tier.store.get(&key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err @ StorageError::Corrupt(_)) => {
                explorer_warn!("{} cache: dropping unreadable {}: {}", tier.name, key, err);
                tier.remove(&key);
                return None;
            }
            Err(err) => {
                explorer_warn!("{} cache: read of {} failed: {}", tier.name, key, err);
                return None;
            }
        };
        let entry: CacheEntry<T> = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(err) => {
                explorer_warn!("{} cache: dropping corrupt {}: {}", tier.name, key, err);
                tier.remove(&key);
                return None;
            }
        };
        if !entry.is_valid(self.clock.now_millis(), tier.ttl) {
            explorer_debug!("{} cache: {} expired", tier.name, key);
            tier.remove(&key);
            return None;
        }
        explorer_debug!("{} cache: hit {}", tier.name, key);
        Some(entry.value)
    }

    /// Stores `value`. On a failed write, expired entries are evicted once and
    /// the write retried once; if it still fails the value is simply not
    /// cached. Returns whether the value was stored.
    pub fn set<T: Serialize>(&self, kind: CacheKind, id: &str, value: &T) -> bool {
        let tier = self.tier(kind);
        let key = cache_key(kind, id);
        let entry = CacheEntry {
            timestamp: self.clock.now_millis(),
            value,
        };
        let text = match serde_json::to_string(&entry) {
            Ok(text) => text,
            Err(err) => {
                explorer_warn!("{} cache: cannot serialize {}: {}", tier.name, key, err);
                return false;
            }
        };

        let Err(first) = tier.store.set(&key, &text) else {
            return true;
        };
        let evicted = tier.evict_expired(self.clock.now_millis());
        explorer_warn!(
            "{} cache: write of {} failed ({}); evicted {} expired entries, retrying",
            tier.name,
            key,
            first,
            evicted
        );
        match tier.store.set(&key, &text) {
            Ok(()) => true,
            Err(err) => {
                explorer_warn!("{} cache: {} not cached: {}", tier.name, key, err);
                false
            }
        }
    }

    /// Bumped by every [`TieredCache::clear_all`].
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Like [`TieredCache::set`], but drops the write when the cache was
    /// cleared after `epoch` was read. Used for responses that were in flight
    /// across a clear.
    pub fn set_in_epoch<T: Serialize>(
        &self,
        epoch: u64,
        kind: CacheKind,
        id: &str,
        value: &T,
    ) -> bool {
        if epoch != self.epoch() {
            explorer_debug!("cache: dropping late write of {}", cache_key(kind, id));
            return false;
        }
        self.set(kind, id, value)
    }

    /// Sweeps the durable tier. Returns the number of entries removed.
    pub fn invalidate_expired(&self) -> usize {
        self.durable.evict_expired(self.clock.now_millis())
    }

    /// Drops every namespaced entry in both tiers.
    pub fn clear_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.durable.clear();
        self.session.clear();
        explorer_debug!("cache: all tiers cleared");
    }
}
