use crate::model::{LeafKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop every cache tier and the payload cache.
    ClearCaches,
    FetchRootMetadata { generation: u64, root_id: NodeId },
    /// Write the navigation snapshot before returning to the caller.
    PersistNavigation,
    EnsureLoaded { id: NodeId },
    ResolveDocument { id: NodeId },
    ShowFolder { id: NodeId },
    ShowUnsupported { id: NodeId, kind: LeafKind },
}
