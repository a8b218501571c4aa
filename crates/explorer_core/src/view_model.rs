use crate::model::{LeafKind, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub root_name: Option<String>,
    /// Visible rows in display order (children of collapsed or unloaded
    /// containers are omitted).
    pub rows: Vec<TreeRowView>,
    pub selected_id: Option<NodeId>,
    pub selected_path: Vec<String>,
    pub drawer_open: bool,
    pub fatal_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRowView {
    pub id: NodeId,
    pub label: String,
    pub depth: usize,
    pub is_container: bool,
    pub kind: Option<LeafKind>,
    pub collapsed: bool,
    pub loading: bool,
    pub selected: bool,
}
