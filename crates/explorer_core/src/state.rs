use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Node, NodeId};
use crate::tree::Tree;
use crate::view_model::{AppViewModel, TreeRowView};

/// Persisted navigation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationState {
    pub selected_id: Option<NodeId>,
    /// Explicit user collapses; containers only.
    pub collapsed_ids: BTreeSet<NodeId>,
    pub drawer_open: bool,
}

impl NavigationState {
    pub fn is_collapsed(&self, node: &Node) -> bool {
        node.is_container && self.collapsed_ids.contains(&node.id)
    }

    /// A container shows its children only when loaded and not collapsed.
    pub fn is_expanded(&self, node: &Node) -> bool {
        node.is_container && node.loaded() && !self.is_collapsed(node)
    }
}

/// Application state owned by one controller: the tree of the current root
/// plus navigation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) generation: u64,
    pub(crate) tree: Tree,
    pub(crate) navigation: NavigationState,
    pub(crate) root_error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a rehydrated navigation snapshot.
    pub fn with_navigation(navigation: NavigationState) -> Self {
        Self {
            navigation,
            ..Self::default()
        }
    }

    /// Generation of the most recently requested root.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn root_error(&self) -> Option<&str> {
        self.root_error.as_deref()
    }

    pub fn view(&self) -> AppViewModel {
        let mut rows = Vec::new();
        if !self.tree.is_empty() {
            self.collect_rows(self.tree.root_id(), 0, &mut rows);
        }
        let selected_path = self
            .navigation
            .selected_id
            .as_deref()
            .map(|id| self.tree.path(id))
            .unwrap_or_default();
        AppViewModel {
            root_name: self.tree.root().map(|root| root.name.clone()),
            rows,
            selected_id: self.navigation.selected_id.clone(),
            selected_path,
            drawer_open: self.navigation.drawer_open,
            fatal_error: self.root_error.clone(),
        }
    }

    fn collect_rows(&self, parent: &str, depth: usize, rows: &mut Vec<TreeRowView>) {
        for node in self.tree.level(parent) {
            rows.push(TreeRowView {
                id: node.id.clone(),
                label: node.label().to_string(),
                depth,
                is_container: node.is_container,
                kind: node.kind,
                collapsed: node.is_container && !self.navigation.is_expanded(node),
                loading: node.loading,
                selected: self.navigation.selected_id.as_deref() == Some(node.id.as_str()),
            });
            if self.navigation.is_expanded(node) {
                self.collect_rows(&node.id, depth + 1, rows);
            }
        }
    }
}
