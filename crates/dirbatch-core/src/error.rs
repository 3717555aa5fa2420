//! Error types for batch orchestration
//!
//! Every lower-layer error converts into [`BatchError`]. Configuration
//! errors abort the run; the rest are I/O failures reported as is.

use std::path::PathBuf;

use dirbatch_parser::ParserError;
use dirbatch_status::RegistryError;
use dirbatch_table::TableError;
use dirbatch_tree::TreeError;

/// Main batch error type
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Invalid batch configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Layout file could not be parsed
    #[error("invalid layout file '{path}': {source}")]
    Layout {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Filesystem failure outside the crawl
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser failure outside the crawl
    #[error("parser error: {0}")]
    Parser(#[from] ParserError),

    /// Directory tree error
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Table or record store error
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Status registry error
    #[error("status error: {0}")]
    Registry(#[from] RegistryError),
}

impl BatchError {
    /// Create configuration error
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create I/O error
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is a configuration error that aborts the run
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::Config(_) | Self::Layout { .. } | Self::Parser(_) | Self::Registry(_) => true,
            Self::Io { .. } => false,
            Self::Tree(err) => err.is_config_error(),
            Self::Table(err) => err.is_config_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_source() {
        assert!(BatchError::config("no maps").is_config_error());
        let io = BatchError::io("/x", std::io::Error::other("disk"));
        assert!(!io.is_config_error());
        let tree: BatchError = TreeError::DepthExceeded {
            declared: 2,
            found: 3,
        }
        .into();
        assert!(tree.is_config_error());
        assert!(tree.to_string().contains("tree error"));
    }
}
