use std::fmt;

use explorer_core::{AppViewModel, GameType, LeafKind, NodeId};

use crate::storage::StorageError;

/// Message shown for every rate-limit failure, whatever the request was.
pub const RATE_LIMITED_MESSAGE: &str =
    "The drive is limiting requests right now. Wait a moment, then reload to try again.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExplorerError {
    pub kind: FailureKind,
    pub message: String,
}

impl ExplorerError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Text for the user. Rate limiting collapses into one fixed message.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::RateLimited => RATE_LIMITED_MESSAGE.to_string(),
            FailureKind::UnresolvedType => {
                format!("This document is not a recognized game: {}", self.message)
            }
            _ => format!("Loading failed: {}", self.message),
        }
    }
}

impl From<StorageError> for ExplorerError {
    fn from(err: StorageError) -> Self {
        let kind = match err {
            StorageError::QuotaExceeded { .. } => FailureKind::StorageFull,
            StorageError::Io(_) | StorageError::Corrupt(_) => FailureKind::Malformed,
        };
        ExplorerError::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    NotFound,
    TransientNetwork,
    Malformed,
    UnresolvedType,
    StorageFull,
    InternalContractViolation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::TransientNetwork => write!(f, "network error"),
            FailureKind::Malformed => write!(f, "malformed response"),
            FailureKind::UnresolvedType => write!(f, "unresolved game type"),
            FailureKind::StorageFull => write!(f, "storage full"),
            FailureKind::InternalContractViolation => write!(f, "internal contract violation"),
        }
    }
}

/// What the content area shows after a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    /// Nothing selected yet.
    Ready,
    Folder {
        id: NodeId,
        path: Vec<String>,
        children: Vec<String>,
    },
    Unsupported {
        id: NodeId,
        path: Vec<String>,
        kind: LeafKind,
    },
    Game {
        id: NodeId,
        path: Vec<String>,
        game_type: GameType,
        entry: String,
    },
    /// Document-scoped failure; browsing continues.
    Error {
        id: NodeId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerEvent {
    TreeChanged(AppViewModel),
    Content(ContentView),
    /// A node's expansion failed; only that node is affected.
    NodeFailed { id: NodeId, message: String },
    /// Root metadata could not be loaded; no navigation is possible.
    Fatal(String),
}
