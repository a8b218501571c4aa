use explorer_core::NavigationState;
use explorer_logging::{explorer_debug, explorer_warn};

use crate::cache::CACHE_NAMESPACE;
use crate::storage::{KeyValueStore, StorageError};

pub fn navigation_key() -> String {
    format!("{CACHE_NAMESPACE}:navigation")
}

/// Restores the snapshot; a missing or unreadable one yields the defaults.
pub fn load_navigation(store: &dyn KeyValueStore) -> NavigationState {
    let key = navigation_key();
    match store.get(&key) {
        Ok(Some(text)) => match serde_json::from_str(&text) {
            Ok(navigation) => navigation,
            Err(err) => {
                explorer_warn!("ignoring corrupt navigation snapshot: {}", err);
                NavigationState::default()
            }
        },
        Ok(None) => NavigationState::default(),
        Err(err) => {
            explorer_warn!("cannot read navigation snapshot: {}", err);
            NavigationState::default()
        }
    }
}

pub fn save_navigation(
    store: &dyn KeyValueStore,
    navigation: &NavigationState,
) -> Result<(), StorageError> {
    let text = serde_json::to_string(navigation)
        .map_err(|err| StorageError::Corrupt(err.to_string()))?;
    store.set(&navigation_key(), &text)?;
    explorer_debug!("navigation saved ({} collapsed)", navigation.collapsed_ids.len());
    Ok(())
}
