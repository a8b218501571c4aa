use std::collections::HashMap;

use crate::model::{Children, Node, NodeId};

/// In-memory tree for one browsed root, stored as an id-keyed arena.
///
/// `generation` changes on every root switch; listing results tagged with an
/// older generation are rejected by [`Tree::apply_level`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    root_id: NodeId,
    generation: u64,
    nodes: HashMap<NodeId, Node>,
    parents: HashMap<NodeId, NodeId>,
}

impl Tree {
    pub fn new(root_id: impl Into<NodeId>, root_name: impl Into<String>, generation: u64) -> Self {
        let root = Node::container(root_id, root_name);
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self {
            root_id,
            generation,
            nodes,
            parents: HashMap::new(),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Children of `id` in level order; empty when not loaded.
    pub fn level(&self, id: &str) -> Vec<&Node> {
        self.nodes
            .get(id)
            .map(|node| {
                node.child_ids()
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Display names from the first level below the root down to `id`.
    pub fn path(&self, id: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = id;
        while cursor != self.root_id {
            let Some(node) = self.nodes.get(cursor) else {
                return Vec::new();
            };
            names.push(node.name.clone());
            match self.parents.get(cursor) {
                Some(parent) => cursor = parent,
                None => return Vec::new(),
            }
        }
        names.reverse();
        names
    }

    /// Marks an unloaded container as loading. Returns `false` when the node
    /// is unknown, a leaf, already loaded, or already loading.
    pub fn begin_load(&mut self, id: &str) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.is_container && !node.loaded() && !node.loading => {
                node.loading = true;
                true
            }
            _ => false,
        }
    }

    /// Applies a fetched level to `parent`. A no-op (returning `false`) when
    /// the result belongs to another generation, the parent is gone, or the
    /// parent is already loaded.
    pub fn apply_level(&mut self, generation: u64, parent: &str, level: Vec<Node>) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.nodes.get(parent) {
            Some(node) if node.is_container && !node.loaded() => {}
            _ => return false,
        }

        let mut ids = Vec::with_capacity(level.len());
        for child in level {
            ids.push(child.id.clone());
            self.parents.insert(child.id.clone(), parent.to_string());
            self.nodes.entry(child.id.clone()).or_insert(child);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = Children::Loaded(ids);
            node.loading = false;
        }
        true
    }

    /// Reverts a failed load so a later expansion can retry.
    pub fn fail_load(&mut self, generation: u64, parent: &str) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.nodes.get_mut(parent) {
            Some(node) if !node.loaded() => {
                node.loading = false;
                node.children = Children::NotLoaded;
                true
            }
            _ => false,
        }
    }
}
