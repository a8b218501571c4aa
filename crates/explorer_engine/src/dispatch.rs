use std::collections::HashMap;
use std::sync::Arc;

use explorer_core::{GameType, NodeId, TypeTable};
use explorer_logging::{explorer_debug, explorer_error};
use tokio::sync::oneshot;

use crate::renderer::{
    run_renderer, GameRenderer, MountedGame, PayloadSource, Renderer, RendererError,
    ResolvedPayloadSource,
};
use crate::resolver::ResolvedPayload;
use crate::{ExplorerError, FailureKind};

pub const DEFAULT_RENDERER_BASE: &str = "games";

/// The isolated view a renderer is mounted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedView {
    pub document_id: NodeId,
    pub game_type: GameType,
    /// Renderer page plus the document id as its only addressing token.
    pub entry: String,
}

/// Content area holding at most one mounted renderer.
#[derive(Debug, Default)]
pub struct ViewSlot {
    current: Option<MountedView>,
    mounts: u64,
}

impl ViewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&MountedView> {
        self.current.as_ref()
    }

    /// Total renderers mounted into this slot.
    pub fn mounts(&self) -> u64 {
        self.mounts
    }

    pub fn clear(&mut self) -> Option<MountedView> {
        self.current.take()
    }

    fn mount(&mut self, view: MountedView) {
        self.current = Some(view);
        self.mounts += 1;
    }
}

/// Reports when the mounted renderer finished initializing.
#[derive(Debug)]
pub struct DispatchHandle {
    view: MountedView,
    ready: oneshot::Receiver<Result<MountedGame, RendererError>>,
}

impl DispatchHandle {
    pub fn view(&self) -> &MountedView {
        &self.view
    }

    pub async fn ready(self) -> Result<MountedGame, RendererError> {
        self.ready.await.unwrap_or(Err(RendererError::Aborted))
    }
}

pub struct Dispatcher {
    renderers: HashMap<GameType, Arc<dyn Renderer>>,
    source: Arc<dyn PayloadSource>,
    base_path: String,
}

impl Dispatcher {
    /// One [`GameRenderer`] per game type.
    pub fn new(
        source: Arc<dyn PayloadSource>,
        base_path: impl Into<String>,
        table: &TypeTable,
    ) -> Self {
        let mut dispatcher = Self::without_renderers(source, base_path);
        for game_type in GameType::ALL {
            dispatcher.register(Arc::new(GameRenderer::new(game_type, table.clone())));
        }
        dispatcher
    }

    pub fn without_renderers(source: Arc<dyn PayloadSource>, base_path: impl Into<String>) -> Self {
        Self {
            renderers: HashMap::new(),
            source,
            base_path: base_path.into(),
        }
    }

    /// Replaces any renderer registered for the same type.
    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(renderer.expected_type(), renderer);
    }

    pub fn entry_for(&self, game_type: GameType, document_id: &str) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(document_id.as_bytes()).collect();
        format!(
            "{}/{}?fileId={}",
            self.base_path.trim_end_matches('/'),
            game_type.renderer_page(),
            encoded
        )
    }

    /// Clears `slot`, mounts the renderer for the resolved type and starts
    /// its lifecycle on the current runtime.
    pub fn dispatch(
        &self,
        resolved: &ResolvedPayload,
        slot: &mut ViewSlot,
    ) -> Result<DispatchHandle, ExplorerError> {
        if let Some(previous) = slot.clear() {
            explorer_debug!("unmounted {}", previous.entry);
        }

        let Some(renderer) = self.renderers.get(&resolved.game_type).cloned() else {
            explorer_error!(
                "no renderer registered for resolved type {} of {}",
                resolved.game_type,
                resolved.document_id
            );
            return Err(ExplorerError::new(
                FailureKind::InternalContractViolation,
                format!("no renderer for {}", resolved.game_type),
            ));
        };

        let view = MountedView {
            document_id: resolved.document_id.clone(),
            game_type: resolved.game_type,
            entry: self.entry_for(resolved.game_type, &resolved.document_id),
        };
        slot.mount(view.clone());
        explorer_debug!("mounted {}", view.entry);

        let (ready_tx, ready) = oneshot::channel();
        let source = ResolvedPayloadSource::new(
            resolved.document_id.clone(),
            resolved.payload.clone(),
            self.source.clone(),
        );
        let document_id = resolved.document_id.clone();
        tokio::spawn(async move {
            let outcome = run_renderer(renderer.as_ref(), &document_id, &source).await;
            if ready_tx.send(outcome).is_err() {
                explorer_debug!("nobody awaits the renderer of {}", document_id);
            }
        });

        Ok(DispatchHandle { view, ready })
    }
}
