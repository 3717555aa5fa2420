//! Directory tree arena
//!
//! Provides [`DirectoryTree`], an arena of [`Node`]s addressed by
//! [`NodeId`]. Detaching a node only removes it from its parent's child
//! list; nothing is ever freed, so ids stay valid for the life of the tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dirbatch_status::{StatusValue, TreeStatus};

use crate::error::TreeError;
use crate::map::DirectoryMap;
use crate::node::{Node, NodeId, NodeKind, NodeSource};

/// Crawl and snapshot settings
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Subdirectory of the root excluded from crawling
    pub reserved: Option<String>,
    /// Directory receiving stage snapshots (none written when unset)
    pub snapshot_dir: Option<PathBuf>,
}

impl TreeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude a root subdirectory from crawling
    #[must_use]
    pub fn with_reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved = Some(name.into());
        self
    }

    /// Write stage snapshots into `dir`
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }
}

/// Typed tree of parameter directories
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) maps: Vec<DirectoryMap>,
    pub(crate) options: TreeOptions,
    pub(crate) has_virtual: bool,
    pub(crate) stage: u32,
    pub(crate) records: HashMap<u64, NodeId>,
}

impl DirectoryTree {
    /// Create a tree holding only the root
    ///
    /// # Errors
    /// Returns error if `maps` is empty.
    pub fn new(
        root: &Path,
        maps: Vec<DirectoryMap>,
        options: TreeOptions,
    ) -> Result<Self, TreeError> {
        if maps.is_empty() {
            return Err(TreeError::NoMaps);
        }
        let root_node = Node::new(
            root.display().to_string(),
            NodeKind::Root,
            TreeStatus::Valid.into(),
        )
        .with_path(root.to_path_buf());
        Ok(Self {
            nodes: vec![root_node],
            maps,
            options,
            has_virtual: false,
            stage: 0,
            records: HashMap::new(),
        })
    }

    pub(crate) fn push(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    /// Root node id
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Root directory path
    #[must_use]
    pub fn root_path(&self) -> Option<&Path> {
        self.nodes[0].path()
    }

    /// Declared directory maps
    #[inline]
    #[must_use]
    pub fn maps(&self) -> &[DirectoryMap] {
        &self.maps
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes ever created, detached runs included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Number of status passes run so far
    #[inline]
    #[must_use]
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Whether any level was grouped into virtual parents
    #[inline]
    #[must_use]
    pub fn has_virtual(&self) -> bool {
        self.has_virtual
    }

    /// Node ids in depth-first pre-order, following children only
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Attached leaves in pre-order (root excluded)
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| id.0 != 0 && self.nodes[id.0].is_leaf())
            .collect()
    }

    /// Virtual parents that still hold their runs as children
    #[must_use]
    pub fn virtual_parents(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[id.0].is_virtual_parent)
            .collect()
    }

    /// Ancestors from the parent up to the root
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(Node::parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p.0].parent;
        }
        out
    }

    /// Whether a leaf sits at the full declared depth with a decoded value
    #[must_use]
    pub fn is_complete(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        let last = self.maps.len() - 1;
        match node.kind {
            NodeKind::Run(map) => map == last,
            NodeKind::Level(map) => {
                map == last
                    && node.is_leaf()
                    && node.attributes.get(self.maps[map].token()).is_some()
            }
            NodeKind::Root => false,
        }
    }

    /// Whether any attached leaf below `id` (or `id` itself) is valid
    #[must_use]
    pub fn has_valid_leaf(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.0];
            if node.is_leaf() {
                if node.status.is_valid() {
                    return true;
                }
            } else {
                stack.extend(node.children.iter().copied());
            }
        }
        false
    }

    /// Set a node's status and flag reason
    ///
    /// # Errors
    /// Returns error if the node does not exist.
    pub fn set_status(
        &mut self,
        id: NodeId,
        status: StatusValue,
        reason: Option<String>,
    ) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        node.status = status;
        node.reason = reason;
        Ok(())
    }

    /// Link a record id to a leaf
    ///
    /// # Errors
    /// Returns error if the node does not exist.
    pub fn assign_record(&mut self, id: NodeId, record_id: u64) -> Result<(), TreeError> {
        self.node_mut(id)?.record_id = Some(record_id);
        self.records.insert(record_id, id);
        Ok(())
    }

    /// Leaf linked to a record id
    #[must_use]
    pub fn node_for_record(&self, record_id: u64) -> Option<NodeId> {
        self.records.get(&record_id).copied()
    }

    /// Nodes created from table rows
    #[must_use]
    pub fn synthesized(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.nodes[id.0].source == NodeSource::Synthesized)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbatch_parser::{ValidatorParser, ValueParser};

    fn maps() -> Vec<DirectoryMap> {
        vec![
            DirectoryMap::new("a", ValidatorParser::starts_with(ValueParser::integer())),
            DirectoryMap::new("b", ValidatorParser::starts_with(ValueParser::integer())),
        ]
    }

    #[test]
    fn arena_links_parents_and_children() {
        let mut tree = DirectoryTree::new(Path::new("/r"), maps(), TreeOptions::new()).unwrap();
        let a = tree.push(
            tree.root(),
            Node::new("a1", NodeKind::Level(0), TreeStatus::Valid.into()),
        );
        let b = tree.push(a, Node::new("b1", NodeKind::Level(1), TreeStatus::Valid.into()));

        assert_eq!(tree.get(b).unwrap().depth(), 2);
        assert_eq!(tree.ancestors(b), vec![a, tree.root()]);
        assert_eq!(tree.leaves(), vec![b]);
        assert_eq!(tree.preorder(), vec![tree.root(), a, b]);
    }

    #[test]
    fn requires_maps() {
        assert!(matches!(
            DirectoryTree::new(Path::new("/r"), Vec::new(), TreeOptions::new()),
            Err(TreeError::NoMaps)
        ));
    }

    #[test]
    fn record_links() {
        let mut tree = DirectoryTree::new(Path::new("/r"), maps(), TreeOptions::new()).unwrap();
        let a = tree.push(
            tree.root(),
            Node::new("a1", NodeKind::Level(0), TreeStatus::Valid.into()),
        );
        tree.assign_record(a, 7).unwrap();
        assert_eq!(tree.node_for_record(7), Some(a));
        assert_eq!(tree.get(a).unwrap().record_id(), Some(7));
        assert!(tree.assign_record(NodeId(99), 8).is_err());
    }
}
