//! Tree nodes
//!
//! Nodes live in the arena owned by
//! [`DirectoryTree`](crate::DirectoryTree) and refer to each other by
//! [`NodeId`].

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use dirbatch_parser::Attributes;
use dirbatch_status::StatusValue;

/// Index of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a node in the level structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Root directory
    Root,
    /// Directory decoded (or rejected) by the map at this index
    Level(usize),
    /// Physical run below a virtual parent of the map at this index
    Run(usize),
}

/// Where a node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSource {
    /// Found on disk
    Filesystem,
    /// Grouping node for runs that share a name
    Virtual,
    /// Created from a table row with no directory
    Synthesized,
}

/// A directory (or synthesized directory) in the tree
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) path: Option<PathBuf>,
    pub(crate) kind: NodeKind,
    pub(crate) depth: usize,
    pub(crate) attributes: Attributes,
    pub(crate) status: StatusValue,
    pub(crate) reason: Option<String>,
    pub(crate) is_virtual_parent: bool,
    pub(crate) source: NodeSource,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) runs: Vec<NodeId>,
    pub(crate) record_id: Option<u64>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind, status: StatusValue) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind,
            depth: 0,
            attributes: Attributes::new(),
            status,
            reason: None,
            is_virtual_parent: false,
            source: NodeSource::Filesystem,
            parent: None,
            children: Vec::new(),
            runs: Vec::new(),
            record_id: None,
        }
    }

    pub(crate) fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub(crate) fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub(crate) fn with_source(mut self, source: NodeSource) -> Self {
        self.source = source;
        self
    }

    /// Directory name (canonical name for virtual and synthesized nodes)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem path, `None` for virtual and synthesized nodes
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Level structure position
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Distance from the root
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Decoded attributes of this level
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Own (leaf) or composite (internal) status
    #[inline]
    #[must_use]
    pub fn status(&self) -> StatusValue {
        self.status
    }

    /// Why the node was flagged invalid
    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether this node groups runs that are not yet flattened
    #[inline]
    #[must_use]
    pub fn is_virtual_parent(&self) -> bool {
        self.is_virtual_parent
    }

    /// Origin of the node
    #[inline]
    #[must_use]
    pub fn source(&self) -> NodeSource {
        self.source
    }

    /// Parent node, `None` for the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered children
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Runs detached by flattening
    #[inline]
    #[must_use]
    pub fn runs(&self) -> &[NodeId] {
        &self.runs
    }

    /// Record id assigned to this leaf
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> Option<u64> {
        self.record_id
    }

    /// Whether the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether flattening picked a run for this node
    #[inline]
    #[must_use]
    pub fn is_flattened(&self) -> bool {
        !self.runs.is_empty()
    }
}
