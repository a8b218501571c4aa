use crate::model::{Node, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Open a root container. `reset` discards navigation and all caches
    /// (root switch); without it persisted collapse state is kept.
    OpenRoot { root_id: NodeId, reset: bool },
    /// Root metadata arrived for the given generation.
    RootMetadataLoaded {
        generation: u64,
        root_id: NodeId,
        name: String,
    },
    /// Root metadata could not be fetched; blocks the whole view.
    RootMetadataFailed { generation: u64, message: String },
    /// User clicked a container's expand/collapse toggle.
    ToggleClicked(NodeId),
    /// User selected a node in the tree.
    NodeSelected(NodeId),
    /// Drawer opened or closed explicitly.
    DrawerSet(bool),
    /// Drawer menu button clicked.
    DrawerToggled,
    /// A load for `parent` is about to be issued.
    LevelRequested { parent: NodeId },
    /// A level listing completed.
    LevelLoaded {
        generation: u64,
        parent: NodeId,
        nodes: Vec<Node>,
    },
    /// A level listing failed; the node reverts to not loaded.
    LevelFailed { generation: u64, parent: NodeId },
    /// Fallback for placeholder wiring.
    NoOp,
}
