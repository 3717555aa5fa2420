//! dirbatch Directory Tree Builder
//!
//! Crawls a root directory whose nested folder names encode parameters,
//! one [`DirectoryMap`] per nesting level, and keeps the result as an arena
//! tree with per-node validity.
//!
//! # Overview
//!
//! - [`DirectoryTree::build`] crawls and decodes every level; names a
//!   parser rejects stay in the tree as invalid leaves
//! - [`DirectoryTree::check_depth`] compares the deepest level with the
//!   declared maps
//! - [`DirectoryTree::flatten_virtual_leaves`] collapses duplicate runs
//!   onto the best one
//! - [`DirectoryTree::synthesize`] adds nodes for key tuples that exist
//!   only in a table
//! - [`DirectoryTree::leaf_records`] flattens complete leaves into records
//!
//! Each status pass writes a `filter_stage_NN_<label>.txt` snapshot when a
//! snapshot directory is configured.

// Core modules
pub mod build;
pub mod error;
pub mod map;
pub mod node;
pub mod passes;
pub mod records;
pub mod snapshot;
pub mod synth;
pub mod tree;

// Re-exports
pub use error::TreeError;
pub use map::DirectoryMap;
pub use node::{Node, NodeId, NodeKind, NodeSource};
pub use passes::{DepthReport, StageReport};
pub use records::LeafRecord;
pub use synth::Synthesis;
pub use tree::{DirectoryTree, TreeOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
