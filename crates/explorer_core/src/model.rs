use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Mime type the remote store uses for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// One raw entry of a remote listing or metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Entry {
    pub fn is_container(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME)
    }
}

/// Closed classification of leaf documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    StructuredDocument,
    Presentation,
    Other,
}

impl LeafKind {
    /// Only structured documents can carry a game payload.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, LeafKind::StructuredDocument)
    }
}

const LEAF_KINDS: &[(&str, &str, LeafKind)] = &[
    (".json", "application/json", LeafKind::StructuredDocument),
    (".pdf", "application/pdf", LeafKind::Presentation),
];

/// Classify a leaf by file-name suffix or declared content type.
pub fn classify_leaf(name: &str, mime_type: Option<&str>) -> LeafKind {
    let lower = name.to_ascii_lowercase();
    LEAF_KINDS
        .iter()
        .find(|(suffix, mime, _)| lower.ends_with(suffix) || mime_type == Some(*mime))
        .map(|(_, _, kind)| *kind)
        .unwrap_or(LeafKind::Other)
}

/// Children of a container: not yet fetched, or the complete ordered level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Children {
    #[default]
    NotLoaded,
    Loaded(Vec<NodeId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub is_container: bool,
    /// `None` for containers.
    pub kind: Option<LeafKind>,
    pub children: Children,
    #[serde(skip)]
    pub loading: bool,
}

impl Node {
    pub fn container(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_container: true,
            kind: None,
            children: Children::NotLoaded,
            loading: false,
        }
    }

    pub fn leaf(id: impl Into<NodeId>, name: impl Into<String>, kind: LeafKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_container: false,
            kind: Some(kind),
            children: Children::NotLoaded,
            loading: false,
        }
    }

    /// Containers become unloaded stubs; leaves are complete.
    pub fn from_entry(entry: &Entry) -> Self {
        if entry.is_container() {
            Self::container(entry.id.clone(), entry.name.clone())
        } else {
            let kind = classify_leaf(&entry.name, entry.mime_type.as_deref());
            Self::leaf(entry.id.clone(), entry.name.clone(), kind)
        }
    }

    pub fn loaded(&self) -> bool {
        matches!(self.children, Children::Loaded(_))
    }

    pub fn child_ids(&self) -> &[NodeId] {
        match &self.children {
            Children::Loaded(ids) => ids,
            Children::NotLoaded => &[],
        }
    }

    /// Name without its final extension (`quiz.json` -> `quiz`).
    pub fn label(&self) -> &str {
        display_label(&self.name)
    }
}

pub fn display_label(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Containers first, then code-point order by name; id breaks ties.
pub fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    b.is_container
        .cmp(&a.is_container)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Turn one raw listing into an ordered level of nodes.
pub fn build_level(entries: &[Entry]) -> Vec<Node> {
    let mut nodes: Vec<Node> = entries.iter().map(Node::from_entry).collect();
    nodes.sort_by(compare_nodes);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_suffix_and_mime() {
        assert_eq!(classify_leaf("quiz.JSON", None), LeafKind::StructuredDocument);
        assert_eq!(
            classify_leaf("noext", Some("application/json")),
            LeafKind::StructuredDocument
        );
        assert_eq!(classify_leaf("slides.pdf", None), LeafKind::Presentation);
        assert_eq!(classify_leaf("notes.txt", Some("text/plain")), LeafKind::Other);
    }

    #[test]
    fn label_strips_last_extension_only() {
        assert_eq!(display_label("quiz.json"), "quiz");
        assert_eq!(display_label("a.b.pdf"), "a.b");
        assert_eq!(display_label(".hidden"), ".hidden");
        assert_eq!(display_label("Topic"), "Topic");
    }
}
