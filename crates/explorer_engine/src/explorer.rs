//! The controller: owns the application state and runs the effects the pure
//! update returns.
//!
//! Every user operation goes through [`SharedState::apply`] and then through
//! `run_effects`, which executes effects in order. Navigation is
//! persisted synchronously before any later effect runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use explorer_core::{AppState, AppViewModel, Effect, LeafKind, Msg, NodeId, TypeTable};
use explorer_logging::{explorer_debug, explorer_info, explorer_warn, set_root_generation};

use crate::cache::TieredCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, ExplorerConfig};
use crate::dispatch::{Dispatcher, ViewSlot, DEFAULT_RENDERER_BASE};
use crate::drive::{DriveApi, ReqwestDriveApi};
use crate::listing::ListingClient;
use crate::navigation::{load_navigation, save_navigation};
use crate::payload_cache::PayloadCache;
use crate::persist::FileStore;
use crate::renderer::CachedPayloadSource;
use crate::resolver::PayloadResolver;
use crate::shared_state::SharedState;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::tree_builder::TreeBuilder;
use crate::{ContentView, ExplorerError, ExplorerEvent};

/// Backing stores: the durable one survives restarts, the session one does not.
#[derive(Clone)]
pub struct Stores {
    pub durable: Arc<dyn KeyValueStore>,
    pub session: Arc<dyn KeyValueStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            durable: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExplorerOptions {
    pub durable_ttl: Duration,
    pub renderer_base: String,
    pub types: TypeTable,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            durable_ttl: Duration::from_secs(30 * 60),
            renderer_base: DEFAULT_RENDERER_BASE.to_string(),
            types: TypeTable::default(),
        }
    }
}

pub struct Explorer {
    state: SharedState,
    durable: Arc<dyn KeyValueStore>,
    cache: Arc<TieredCache>,
    listing: Arc<ListingClient>,
    builder: TreeBuilder,
    payloads: PayloadCache,
    resolver: PayloadResolver,
    dispatcher: Dispatcher,
    slot: Mutex<ViewSlot>,
    content: Mutex<ContentView>,
    events: Mutex<Vec<ExplorerEvent>>,
}

impl Explorer {
    /// Rehydrates navigation from the durable store; no remote call is made
    /// until a root is opened.
    pub fn new(
        api: Arc<dyn DriveApi>,
        stores: Stores,
        clock: Arc<dyn Clock>,
        options: ExplorerOptions,
    ) -> Self {
        let cache = Arc::new(TieredCache::new(
            stores.durable.clone(),
            stores.session.clone(),
            options.durable_ttl,
            clock,
        ));
        let listing = Arc::new(ListingClient::new(api.clone(), cache.clone()));
        let payloads = PayloadCache::new(stores.session.clone());
        let source = Arc::new(CachedPayloadSource::new(payloads.clone(), api.clone()));
        let navigation = load_navigation(stores.durable.as_ref());

        Self {
            state: SharedState::new(AppState::with_navigation(navigation)),
            durable: stores.durable,
            builder: TreeBuilder::new(listing.clone()),
            resolver: PayloadResolver::new(api, payloads.clone(), options.types.clone()),
            dispatcher: Dispatcher::new(source, options.renderer_base, &options.types),
            cache,
            listing,
            payloads,
            slot: Mutex::new(ViewSlot::new()),
            content: Mutex::new(ContentView::Ready),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Live HTTP client, file-backed durable store, in-memory session store.
    pub fn from_config(config: &ExplorerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let api = ReqwestDriveApi::new(config.drive_settings()).map_err(ConfigError::Client)?;
        let durable = FileStore::open(&config.storage_dir)?.with_quota(config.storage_quota);
        let stores = Stores {
            durable: Arc::new(durable),
            session: Arc::new(MemoryStore::new()),
        };
        let options = ExplorerOptions {
            durable_ttl: config.durable_ttl(),
            renderer_base: config.renderer_base.clone(),
            types: TypeTable::default(),
        };
        Ok(Self::new(Arc::new(api), stores, Arc::new(SystemClock), options))
    }

    /// Opens `root_id` keeping persisted collapse state. A failure here blocks
    /// the whole view.
    pub async fn open_root(&self, root_id: &str) -> Result<(), ExplorerError> {
        let swept = self.cache.invalidate_expired();
        if swept > 0 {
            explorer_debug!("swept {} expired cache entries", swept);
        }
        self.handle(Msg::OpenRoot {
            root_id: root_id.to_string(),
            reset: false,
        })
        .await
    }

    /// Replaces the root: caches and navigation are discarded and responses
    /// still in flight for the previous root are ignored.
    pub async fn switch_root(&self, root_id: &str) -> Result<(), ExplorerError> {
        self.handle(Msg::OpenRoot {
            root_id: root_id.to_string(),
            reset: true,
        })
        .await
    }

    pub async fn toggle(&self, id: &str) -> Result<(), ExplorerError> {
        self.handle(Msg::ToggleClicked(id.to_string())).await
    }

    pub async fn select(&self, id: &str) -> Result<(), ExplorerError> {
        self.handle(Msg::NodeSelected(id.to_string())).await
    }

    pub async fn set_drawer_open(&self, open: bool) -> Result<(), ExplorerError> {
        self.handle(Msg::DrawerSet(open)).await
    }

    pub async fn toggle_drawer(&self) -> Result<(), ExplorerError> {
        self.handle(Msg::DrawerToggled).await
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn content(&self) -> ContentView {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn listing(&self) -> &ListingClient {
        &self.listing
    }

    pub fn payloads(&self) -> &PayloadCache {
        &self.payloads
    }

    /// Events produced since the last call.
    pub fn drain_events(&self) -> Vec<ExplorerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    async fn handle(&self, msg: Msg) -> Result<(), ExplorerError> {
        let effects = self.state.apply(msg);
        let outcome = self.run_effects(effects).await;
        self.emit(ExplorerEvent::TreeChanged(self.view()));
        outcome
    }

    /// Runs effects in order, feeding follow-up messages back through the
    /// update. Returns the first failure after running everything.
    async fn run_effects(&self, effects: Vec<Effect>) -> Result<(), ExplorerError> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut first_error = None;
        while let Some(effect) = queue.pop_front() {
            match self.run_effect(effect).await {
                Ok(follow_up) => queue.extend(follow_up),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn run_effect(&self, effect: Effect) -> Result<Vec<Effect>, ExplorerError> {
        match effect {
            Effect::ClearCaches => {
                self.cache.clear_all();
                self.payloads.clear();
                self.lock_slot().clear();
                self.set_content(ContentView::Ready);
                Ok(Vec::new())
            }
            Effect::FetchRootMetadata {
                generation,
                root_id,
            } => {
                set_root_generation(generation);
                explorer_info!("opening root {}", root_id);
                match self.listing.get_metadata(&root_id).await {
                    Ok(entry) => Ok(self.state.apply(Msg::RootMetadataLoaded {
                        generation,
                        root_id,
                        name: entry.name,
                    })),
                    Err(err) => {
                        let message = err.user_message();
                        self.state.apply(Msg::RootMetadataFailed {
                            generation,
                            message: message.clone(),
                        });
                        if self.state.read(|app| app.generation()) == generation {
                            self.emit(ExplorerEvent::Fatal(message));
                        }
                        Err(err)
                    }
                }
            }
            Effect::PersistNavigation => {
                let navigation = self.state.read(|app| app.navigation().clone());
                if let Err(err) = save_navigation(self.durable.as_ref(), &navigation) {
                    // Navigation keeps working in memory; only the snapshot is stale.
                    explorer_warn!("navigation not persisted: {}", ExplorerError::from(err));
                }
                Ok(Vec::new())
            }
            Effect::EnsureLoaded { id } => {
                let result = self.builder.ensure_loaded(&self.state, &id).await;
                if let Err(err) = &result {
                    self.emit(ExplorerEvent::NodeFailed {
                        id,
                        message: err.user_message(),
                    });
                }
                result.map(|()| Vec::new())
            }
            Effect::ResolveDocument { id } => {
                self.resolve_and_dispatch(id).await.map(|()| Vec::new())
            }
            Effect::ShowFolder { id } => {
                let (path, children) = self.state.read(|app| {
                    let tree = app.tree();
                    let children = tree
                        .level(&id)
                        .into_iter()
                        .map(|node| node.label().to_string())
                        .collect();
                    (tree.path(&id), children)
                });
                self.lock_slot().clear();
                self.set_content(ContentView::Folder { id, path, children });
                Ok(Vec::new())
            }
            Effect::ShowUnsupported { id, kind } => {
                self.show_unsupported(id, kind);
                Ok(Vec::new())
            }
        }
    }

    async fn resolve_and_dispatch(&self, id: NodeId) -> Result<(), ExplorerError> {
        let generation = self.state.read(|app| app.generation());
        let resolved = self.resolver.resolve(&id).await;
        if self.is_stale(generation, &id) {
            explorer_debug!("discarding resolution of {}; selection moved on", id);
            return Ok(());
        }
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                self.lock_slot().clear();
                self.set_content(ContentView::Error {
                    id,
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        let dispatched = {
            let mut slot = self.lock_slot();
            self.dispatcher.dispatch(&resolved, &mut slot)
        };
        let handle = match dispatched {
            Ok(handle) => handle,
            Err(err) => {
                self.set_content(ContentView::Error {
                    id,
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        let path = self.state.read(|app| app.tree().path(&id));
        let entry = handle.view().entry.clone();
        match handle.ready().await {
            Ok(mounted) => {
                explorer_info!("{} mounted for {}", mounted.game_type, id);
                if !self.is_stale(generation, &id) {
                    self.set_content(ContentView::Game {
                        id,
                        path,
                        game_type: resolved.game_type,
                        entry,
                    });
                }
            }
            Err(err) => {
                explorer_warn!("renderer for {} failed: {}", id, err);
                if !self.is_stale(generation, &id) {
                    self.set_content(ContentView::Error {
                        id,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn show_unsupported(&self, id: NodeId, kind: LeafKind) {
        let path = self.state.read(|app| app.tree().path(&id));
        self.lock_slot().clear();
        self.set_content(ContentView::Unsupported { id, path, kind });
    }

    /// True once the root changed or another node was selected.
    fn is_stale(&self, generation: u64, id: &str) -> bool {
        self.state.read(|app| {
            app.generation() != generation
                || app.navigation().selected_id.as_deref() != Some(id)
        })
    }

    fn set_content(&self, view: ContentView) {
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = view.clone();
        self.emit(ExplorerEvent::Content(view));
    }

    fn emit(&self, event: ExplorerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, ViewSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
