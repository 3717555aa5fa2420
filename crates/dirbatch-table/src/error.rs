//! Error types for table loading and reconciliation

use std::path::PathBuf;

use dirbatch_parser::ParserError;
use dirbatch_status::RegistryError;
use dirbatch_tree::TreeError;

/// Errors raised by the record store, table I/O and reconciliation
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// CSV read or write failure
    #[error("CSV error at '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A declared key column is absent from the table
    #[error("column '{column}' does not exist in CSV table at '{path}'")]
    MissingColumn { column: String, path: PathBuf },

    /// A key value has no exact-comparison form
    #[error("cannot compare values of column '{column}': {source}")]
    Key {
        column: String,
        #[source]
        source: ParserError,
    },

    /// Record id not present in the store
    #[error("record {0} does not exist")]
    UnknownRecord(u64),

    /// Table map list does not line up with the directory maps
    #[error("table maps do not match directory maps: {0}")]
    MapMismatch(String),

    /// Tree failure during synthesis or a status pass
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Status registry failure
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TableError {
    /// Create CSV error
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is a configuration error that aborts the run
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::Tree(err) => err.is_config_error(),
            Self::Csv { .. } => false,
            _ => true,
        }
    }
}
