//! Payload resolution state machine.
//!
//! A resolution attempt for one document starts in `CacheCheck`. The runner
//! executes the returned effects and feeds their outcomes back as
//! [`ResolveMsg`]s until the phase is terminal. A cached payload that fails
//! validation is dropped and fetched exactly once more; a freshly fetched
//! payload that fails validation is terminal.

use crate::game_type::{infer_type, GameType, TypeTable};
use crate::model::NodeId;
use crate::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// The declared type maps to a renderer.
    Declared(GameType),
    /// The declared type was missing or unmapped; the shape matched a rule.
    Inferred(GameType),
    Unresolved,
}

pub fn validate_payload(payload: &Payload, table: &TypeTable) -> Validation {
    if let Some(game_type) = payload.declared_type().and_then(|raw| table.lookup(raw)) {
        return Validation::Declared(game_type);
    }
    match infer_type(payload.fields()) {
        Some(game_type) => Validation::Inferred(game_type),
        None => Validation::Unresolved,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveFailure {
    /// Neither the declared type nor any shape rule produced a game type.
    UnresolvedType,
    /// The remote fetch itself failed; the runner holds the cause.
    FetchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePhase {
    CacheCheck,
    Fetching { after_invalid_cache: bool },
    Resolved(GameType),
    Failed(ResolveFailure),
}

impl ResolvePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, ResolvePhase::Resolved(_) | ResolvePhase::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveMsg {
    CacheLooked(Option<Payload>),
    Fetched(Payload),
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveEffect {
    LookupCache { document_id: NodeId },
    Fetch { document_id: NodeId },
    StoreCache { document_id: NodeId, payload: Payload },
    DropCache { document_id: NodeId },
}

impl ResolveEffect {
    /// Whether executing this effect produces a message to feed back.
    pub fn yields_msg(&self) -> bool {
        matches!(
            self,
            ResolveEffect::LookupCache { .. } | ResolveEffect::Fetch { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    document_id: NodeId,
    phase: ResolvePhase,
    payload: Option<Payload>,
    fetches: u32,
}

impl Resolution {
    /// Starts a fresh attempt at `CacheCheck`.
    pub fn start(document_id: impl Into<NodeId>) -> (Self, Vec<ResolveEffect>) {
        let document_id = document_id.into();
        let effects = vec![ResolveEffect::LookupCache {
            document_id: document_id.clone(),
        }];
        (
            Self {
                document_id,
                phase: ResolvePhase::CacheCheck,
                payload: None,
                fetches: 0,
            },
            effects,
        )
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn phase(&self) -> ResolvePhase {
        self.phase
    }

    /// Remote fetches issued so far in this attempt.
    pub fn fetches(&self) -> u32 {
        self.fetches
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<Payload> {
        self.payload
    }

    fn fetch(&mut self, after_invalid_cache: bool) -> ResolveEffect {
        self.phase = ResolvePhase::Fetching {
            after_invalid_cache,
        };
        self.fetches += 1;
        ResolveEffect::Fetch {
            document_id: self.document_id.clone(),
        }
    }

    fn store(&self, payload: &Payload) -> ResolveEffect {
        ResolveEffect::StoreCache {
            document_id: self.document_id.clone(),
            payload: payload.clone(),
        }
    }
}

/// Pure transition: applies one outcome and returns the effects to run next.
/// Messages that do not fit the current phase are ignored.
pub fn resolve_step(
    mut resolution: Resolution,
    msg: ResolveMsg,
    table: &TypeTable,
) -> (Resolution, Vec<ResolveEffect>) {
    let effects = match (resolution.phase, msg) {
        (ResolvePhase::CacheCheck, ResolveMsg::CacheLooked(None)) => {
            vec![resolution.fetch(false)]
        }
        (ResolvePhase::CacheCheck, ResolveMsg::CacheLooked(Some(mut payload))) => {
            match validate_payload(&payload, table) {
                Validation::Declared(game_type) => {
                    resolution.phase = ResolvePhase::Resolved(game_type);
                    resolution.payload = Some(payload);
                    Vec::new()
                }
                Validation::Inferred(game_type) => {
                    payload.set_declared_type(game_type);
                    let refresh = resolution.store(&payload);
                    resolution.phase = ResolvePhase::Resolved(game_type);
                    resolution.payload = Some(payload);
                    vec![refresh]
                }
                Validation::Unresolved => {
                    let discard = ResolveEffect::DropCache {
                        document_id: resolution.document_id.clone(),
                    };
                    vec![discard, resolution.fetch(true)]
                }
            }
        }
        (ResolvePhase::Fetching { .. }, ResolveMsg::Fetched(mut payload)) => {
            let mut effects = vec![resolution.store(&payload)];
            match validate_payload(&payload, table) {
                Validation::Declared(game_type) => {
                    resolution.phase = ResolvePhase::Resolved(game_type);
                    resolution.payload = Some(payload);
                }
                Validation::Inferred(game_type) => {
                    payload.set_declared_type(game_type);
                    effects.push(resolution.store(&payload));
                    resolution.phase = ResolvePhase::Resolved(game_type);
                    resolution.payload = Some(payload);
                }
                Validation::Unresolved => {
                    resolution.phase = ResolvePhase::Failed(ResolveFailure::UnresolvedType);
                }
            }
            effects
        }
        (ResolvePhase::Fetching { .. }, ResolveMsg::FetchFailed) => {
            resolution.phase = ResolvePhase::Failed(ResolveFailure::FetchFailed);
            Vec::new()
        }
        _ => Vec::new(),
    };

    (resolution, effects)
}
