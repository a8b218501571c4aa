//! Explorer engine: storage, remote listing, tree loading, payload resolution
//! and dispatch, plus the controller that executes core effects.
mod cache;
mod clock;
mod config;
mod dispatch;
mod drive;
mod engine;
mod explorer;
mod filename;
mod listing;
mod navigation;
mod payload_cache;
mod persist;
mod renderer;
mod resolver;
mod shared_state;
mod storage;
mod tree_builder;
mod types;

pub use cache::{cache_key, CacheEntry, CacheKind, TieredCache, CACHE_NAMESPACE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ExplorerConfig, API_KEY_ENV, ROOT_FOLDER_ENV};
pub use dispatch::{DispatchHandle, Dispatcher, MountedView, ViewSlot, DEFAULT_RENDERER_BASE};
pub use drive::{
    parse_payload, DriveApi, DriveSettings, ListPage, ReqwestDriveApi, DEFAULT_FILES_ENDPOINT,
};
pub use engine::{ExplorerCommand, ExplorerHandle};
pub use explorer::{Explorer, ExplorerOptions, Stores};
pub use filename::record_filename;
pub use listing::ListingClient;
pub use navigation::{load_navigation, navigation_key, save_navigation};
pub use payload_cache::{payload_key, PayloadCache, PAYLOAD_KEY_PREFIX};
pub use persist::{ensure_store_dir, AtomicFileWriter, FileStore};
pub use renderer::{
    run_renderer, CachedPayloadSource, GameRenderer, MountedGame, PayloadSource, Renderer,
    RendererError, ResolvedPayloadSource,
};
pub use resolver::{PayloadResolver, ResolvedPayload};
pub use shared_state::SharedState;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use tree_builder::TreeBuilder;
pub use types::{ContentView, ExplorerError, ExplorerEvent, FailureKind, RATE_LIMITED_MESSAGE};
