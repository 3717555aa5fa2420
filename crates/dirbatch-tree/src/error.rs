//! Error types for tree construction
//!
//! A single subdirectory that fails to parse is not an error here; it is
//! kept as an invalid node. These variants are structural violations that
//! abort the run.

use std::path::PathBuf;

use dirbatch_parser::ParserError;
use dirbatch_status::RegistryError;

use crate::node::NodeId;

/// Errors raised while building or updating a directory tree
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Root directory does not exist or is not a directory
    #[error("root directory '{0}' does not exist")]
    MissingRoot(PathBuf),

    /// No directory maps were declared
    #[error("at least one directory map is required")]
    NoMaps,

    /// Directory listing failed
    #[error("failed to list '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Snapshot file could not be written
    #[error("failed to write snapshot '{path}': {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser composition failed on a name
    #[error("parser for directory map '{map}' failed on '{name}': {source}")]
    Parser {
        map: String,
        name: String,
        #[source]
        source: ParserError,
    },

    /// Parser returned attributes that break its contract
    #[error("parser for directory map '{map}' returned malformed output for '{name}': {reason}")]
    MalformedOutput {
        map: String,
        name: String,
        reason: String,
    },

    /// Some siblings carry a run suffix and others do not
    #[error(
        "only some subdirectories of '{path}' carry a suffix ({with_suffix} with, {without_suffix} without)"
    )]
    MixedVirtualSiblings {
        path: PathBuf,
        with_suffix: usize,
        without_suffix: usize,
    },

    /// Tree is deeper than the declared directory maps
    #[error("max tree depth greater than number of directory maps: specified {declared}, found {found}")]
    DepthExceeded { declared: usize, found: usize },

    /// Key tuple length differs from the number of directory maps
    #[error("expected {expected} key values, got {found}")]
    KeyArity { expected: usize, found: usize },

    /// Node id not present in the arena
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    /// Status registry failure
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TreeError {
    /// Create parser failure error
    pub fn parser(map: impl Into<String>, name: impl Into<String>, source: ParserError) -> Self {
        Self::Parser {
            map: map.into(),
            name: name.into(),
            source,
        }
    }

    /// Create malformed output error
    pub fn malformed(
        map: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedOutput {
            map: map.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a configuration error that aborts the run
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        !matches!(self, Self::Walk { .. } | Self::Snapshot { .. })
    }
}
