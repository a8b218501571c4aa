use std::collections::VecDeque;
use std::sync::Arc;

use explorer_core::{
    resolve_step, GameType, NodeId, Payload, Resolution, ResolveEffect, ResolveFailure,
    ResolveMsg, ResolvePhase, TypeTable,
};
use explorer_logging::{explorer_debug, explorer_info, explorer_warn};

use crate::drive::{parse_payload, DriveApi};
use crate::payload_cache::PayloadCache;
use crate::{ExplorerError, FailureKind};

/// A payload whose game type is known and which is ready to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPayload {
    pub document_id: NodeId,
    pub game_type: GameType,
    pub payload: Payload,
}

/// Runs the resolution state machine against the payload cache and the
/// remote store.
pub struct PayloadResolver {
    api: Arc<dyn DriveApi>,
    cache: PayloadCache,
    table: TypeTable,
}

impl PayloadResolver {
    pub fn new(api: Arc<dyn DriveApi>, cache: PayloadCache, table: TypeTable) -> Self {
        Self { api, cache, table }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub async fn resolve(&self, document_id: &str) -> Result<ResolvedPayload, ExplorerError> {
        let epoch = self.cache.epoch();
        let (mut resolution, effects) = Resolution::start(document_id);
        let mut pending: VecDeque<ResolveEffect> = effects.into();
        let mut fetch_error: Option<ExplorerError> = None;

        while let Some(effect) = pending.pop_front() {
            let Some(msg) = self.run_effect(effect, epoch, &mut fetch_error).await else {
                continue;
            };
            let (next, effects) = resolve_step(resolution, msg, &self.table);
            resolution = next;
            pending.extend(effects);
        }

        let fetches = resolution.fetches();
        match resolution.phase() {
            ResolvePhase::Resolved(game_type) => {
                explorer_info!(
                    "resolved {} as {} after {} fetch(es)",
                    document_id,
                    game_type,
                    fetches
                );
                let payload = resolution.into_payload().ok_or_else(|| {
                    ExplorerError::new(
                        FailureKind::InternalContractViolation,
                        format!("{document_id} resolved without a payload"),
                    )
                })?;
                Ok(ResolvedPayload {
                    document_id: document_id.to_string(),
                    game_type,
                    payload,
                })
            }
            ResolvePhase::Failed(ResolveFailure::UnresolvedType) => {
                explorer_warn!("{} has no usable game type", document_id);
                Err(ExplorerError::new(
                    FailureKind::UnresolvedType,
                    format!("{document_id} declares no known type and matches no known shape"),
                ))
            }
            ResolvePhase::Failed(ResolveFailure::FetchFailed) => Err(fetch_error.unwrap_or_else(
                || ExplorerError::new(FailureKind::TransientNetwork, "document fetch failed"),
            )),
            phase => Err(ExplorerError::new(
                FailureKind::InternalContractViolation,
                format!("resolution of {document_id} stalled in {phase:?}"),
            )),
        }
    }

    async fn run_effect(
        &self,
        effect: ResolveEffect,
        epoch: u64,
        fetch_error: &mut Option<ExplorerError>,
    ) -> Option<ResolveMsg> {
        match effect {
            ResolveEffect::LookupCache { document_id } => {
                Some(ResolveMsg::CacheLooked(self.cache.get(&document_id)))
            }
            ResolveEffect::Fetch { document_id } => {
                explorer_debug!("fetching document {}", document_id);
                let fetched = match self.api.fetch_document(&document_id).await {
                    Ok(body) => parse_payload(&body),
                    Err(err) => Err(err),
                };
                match fetched {
                    Ok(payload) => Some(ResolveMsg::Fetched(payload)),
                    Err(err) => {
                        explorer_warn!("fetch of {} failed: {}", document_id, err);
                        *fetch_error = Some(err);
                        Some(ResolveMsg::FetchFailed)
                    }
                }
            }
            ResolveEffect::StoreCache {
                document_id,
                payload,
            } => {
                self.cache.put_in_epoch(epoch, &document_id, &payload);
                None
            }
            ResolveEffect::DropCache { document_id } => {
                explorer_debug!("dropping cached payload of {}", document_id);
                self.cache.remove(&document_id);
                None
            }
        }
    }
}
