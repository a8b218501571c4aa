//! Per-type game renderers and their start-up lifecycle.
//!
//! A renderer is addressed by document id only. It loads its own payload
//! through a [`PayloadSource`], checks the payload header against the single
//! type it expects and refuses to start on a mismatch.

use std::sync::Arc;

use explorer_core::{normalize_type, GameType, Payload, TypeTable};
use explorer_logging::{explorer_debug, explorer_error, explorer_info};
use thiserror::Error;

use crate::drive::{parse_payload, DriveApi};
use crate::payload_cache::PayloadCache;
use crate::ExplorerError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("cannot load payload for {document_id}: {source}")]
    Load {
        document_id: String,
        source: ExplorerError,
    },
    #[error("payload declares no game type, expected {expected}")]
    MissingType { expected: GameType },
    #[error("payload declares {found}, expected {expected}")]
    TypeMismatch { expected: GameType, found: String },
    #[error("payload has no {field} entries")]
    MissingContent { field: &'static str },
    #[error("renderer stopped before reporting readiness")]
    Aborted,
}

/// Summary of a started game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedGame {
    pub game_type: GameType,
    pub document_id: String,
    pub title: Option<String>,
    /// Length of the game's primary array.
    pub items: usize,
}

pub trait Renderer: Send + Sync {
    fn expected_type(&self) -> GameType;

    /// Whether a declared type string names this renderer's type.
    fn accepts(&self, declared: &str) -> bool {
        normalize_type(declared) == self.expected_type().as_str()
    }

    fn mount(&self, payload: &Payload, document_id: &str) -> Result<MountedGame, RendererError>;
}

/// Renderer for one entry of the game-type table.
#[derive(Debug, Clone)]
pub struct GameRenderer {
    game_type: GameType,
    table: TypeTable,
}

impl GameRenderer {
    pub fn new(game_type: GameType, table: TypeTable) -> Self {
        Self { game_type, table }
    }
}

impl Renderer for GameRenderer {
    fn expected_type(&self) -> GameType {
        self.game_type
    }

    fn accepts(&self, declared: &str) -> bool {
        self.table.lookup(declared) == Some(self.game_type)
    }

    fn mount(&self, payload: &Payload, document_id: &str) -> Result<MountedGame, RendererError> {
        let mut items = None;
        for &field in self.game_type.required_arrays() {
            match payload.array_len(field) {
                Some(len) if len > 0 => {
                    items.get_or_insert(len);
                }
                _ => return Err(RendererError::MissingContent { field }),
            }
        }
        Ok(MountedGame {
            game_type: self.game_type,
            document_id: document_id.to_string(),
            title: payload.title().map(str::to_string),
            items: items.unwrap_or_default(),
        })
    }
}

/// Where a renderer obtains its payload from.
#[async_trait::async_trait]
pub trait PayloadSource: Send + Sync {
    /// The stored copy, if any. Never goes remote.
    fn cached(&self, _document_id: &str) -> Option<Payload> {
        None
    }

    async fn load(&self, document_id: &str) -> Result<Payload, ExplorerError>;
}

/// Payload cache first; on a miss the document is fetched and cached.
pub struct CachedPayloadSource {
    cache: PayloadCache,
    api: Arc<dyn DriveApi>,
}

impl CachedPayloadSource {
    pub fn new(cache: PayloadCache, api: Arc<dyn DriveApi>) -> Self {
        Self { cache, api }
    }
}

#[async_trait::async_trait]
impl PayloadSource for CachedPayloadSource {
    fn cached(&self, document_id: &str) -> Option<Payload> {
        self.cache.get(document_id)
    }

    async fn load(&self, document_id: &str) -> Result<Payload, ExplorerError> {
        if let Some(payload) = self.cached(document_id) {
            return Ok(payload);
        }
        explorer_debug!("renderer fetching {} directly", document_id);
        let epoch = self.cache.epoch();
        let body = self.api.fetch_document(document_id).await?;
        let payload = parse_payload(&body)?;
        self.cache.put_in_epoch(epoch, document_id, &payload);
        Ok(payload)
    }
}

/// Source for one dispatch: the cache first, then the payload the resolver
/// already holds in memory. The raw document is only fetched for other ids,
/// since it lacks any inferred type.
pub struct ResolvedPayloadSource {
    document_id: String,
    payload: Payload,
    inner: Arc<dyn PayloadSource>,
}

impl ResolvedPayloadSource {
    pub fn new(
        document_id: impl Into<String>,
        payload: Payload,
        inner: Arc<dyn PayloadSource>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            payload,
            inner,
        }
    }
}

#[async_trait::async_trait]
impl PayloadSource for ResolvedPayloadSource {
    fn cached(&self, document_id: &str) -> Option<Payload> {
        self.inner.cached(document_id)
    }

    async fn load(&self, document_id: &str) -> Result<Payload, ExplorerError> {
        if let Some(payload) = self.inner.cached(document_id) {
            return Ok(payload);
        }
        if document_id == self.document_id {
            explorer_debug!("{} not in the payload cache; using the resolved copy", document_id);
            return Ok(self.payload.clone());
        }
        self.inner.load(document_id).await
    }
}

/// Loads the payload, validates its header and mounts the game.
pub async fn run_renderer(
    renderer: &dyn Renderer,
    document_id: &str,
    source: &dyn PayloadSource,
) -> Result<MountedGame, RendererError> {
    let expected = renderer.expected_type();
    let payload = source
        .load(document_id)
        .await
        .map_err(|source| RendererError::Load {
            document_id: document_id.to_string(),
            source,
        })?;

    match payload.declared_type() {
        None => {
            explorer_error!("{} renderer got {} without a type", expected, document_id);
            return Err(RendererError::MissingType { expected });
        }
        Some(found) if !renderer.accepts(found) => {
            explorer_error!("{} renderer got {} declared as {}", expected, document_id, found);
            return Err(RendererError::TypeMismatch {
                expected,
                found: found.to_string(),
            });
        }
        Some(_) => {}
    }

    let mounted = renderer.mount(&payload, document_id)?;
    explorer_info!("{} ready for {} ({} items)", expected, document_id, mounted.items);
    Ok(mounted)
}

#[cfg(test)]
mod tests {
    use explorer_core::{GameType, Payload, TypeTable};
    use serde_json::json;

    use super::{GameRenderer, Renderer, RendererError};

    #[test]
    fn aliases_are_accepted_by_the_table_backed_renderer() {
        let renderer = GameRenderer::new(GameType::QuickQuiz, TypeTable::default());
        assert!(renderer.accepts("Quick-Quiz"));
        assert!(renderer.accepts("quiz"));
        assert!(!renderer.accepts("matching"));
    }

    #[test]
    fn empty_required_array_blocks_mount() {
        let renderer = GameRenderer::new(GameType::SortierSpiel, TypeTable::default());
        let payload = Payload::from_value(json!({
            "game_type": "sortier_spiel",
            "columns": [{"id": "a"}],
            "cards": []
        }))
        .expect("object");

        assert_eq!(
            renderer.mount(&payload, "doc"),
            Err(RendererError::MissingContent { field: "cards" })
        );
    }
}
