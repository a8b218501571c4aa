use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use explorer_core::{build_level, Msg, Node, NodeId};
use explorer_logging::{explorer_debug, explorer_info, explorer_warn};
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::cache::CacheKind;
use crate::listing::ListingClient;
use crate::shared_state::SharedState;
use crate::ExplorerError;

type LevelFuture = Shared<BoxFuture<'static, Result<Vec<Node>, ExplorerError>>>;

/// Materializes the tree one level at a time.
///
/// Loads are keyed by root generation and node id; a caller arriving while a
/// load is in flight awaits the same shared future instead of issuing a
/// second listing call.
pub struct TreeBuilder {
    listing: Arc<ListingClient>,
    in_flight: Mutex<HashMap<(u64, NodeId), LevelFuture>>,
}

impl TreeBuilder {
    pub fn new(listing: Arc<ListingClient>) -> Self {
        Self {
            listing,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// One ordered level below `id`; containers come back as unloaded stubs.
    pub async fn build_level(&self, id: &str) -> Result<Vec<Node>, ExplorerError> {
        load_level(self.listing.clone(), id.to_string()).await
    }

    /// Loads the children of `id` into the tree unless already loaded.
    ///
    /// Unknown ids and leaves are no-ops. A failure reverts the node to not
    /// loaded and is returned to every caller awaiting that load. The outcome
    /// is applied to the tree once per load.
    pub async fn ensure_loaded(&self, state: &SharedState, id: &str) -> Result<(), ExplorerError> {
        let generation = state.read(|app| {
            app.tree()
                .node(id)
                .filter(|node| node.is_container && !node.loaded())
                .map(|_| app.tree().generation())
        });
        let Some(generation) = generation else {
            return Ok(());
        };

        state.apply(Msg::LevelRequested {
            parent: id.to_string(),
        });
        let key = (generation, id.to_string());
        let load = {
            let mut in_flight = self.lock_in_flight();
            in_flight
                .entry(key.clone())
                .or_insert_with(|| {
                    explorer_debug!("starting load of {}", id);
                    load_level(self.listing.clone(), id.to_string())
                        .boxed()
                        .shared()
                })
                .clone()
        };

        let result = load.clone().await;
        // The first waiter to finish retires the entry and applies the result.
        // Later waiters of the same load may find a newer load under the key.
        let owner = {
            let mut in_flight = self.lock_in_flight();
            let current = in_flight
                .get(&key)
                .is_some_and(|entry| entry.ptr_eq(&load));
            if current {
                in_flight.remove(&key);
            }
            current
        };
        if !owner {
            return result.map(|_| ());
        }

        match result {
            Ok(nodes) => {
                let count = nodes.len();
                state.apply(Msg::LevelLoaded {
                    generation,
                    parent: id.to_string(),
                    nodes,
                });
                explorer_info!("loaded {} with {} entries", id, count);
                Ok(())
            }
            Err(err) => {
                explorer_warn!("loading {} failed: {}", id, err);
                state.apply(Msg::LevelFailed {
                    generation,
                    parent: id.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Number of loads currently awaiting a response.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<(u64, NodeId), LevelFuture>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load_level(listing: Arc<ListingClient>, id: String) -> Result<Vec<Node>, ExplorerError> {
    if let Some(nodes) = listing.cache().get::<Vec<Node>>(CacheKind::Level, &id) {
        return Ok(nodes);
    }
    let epoch = listing.cache().epoch();
    let entries = listing.get_children(&id).await?;
    let nodes = build_level(&entries);
    listing.cache().set_in_epoch(epoch, CacheKind::Level, &id, &nodes);
    Ok(nodes)
}
