//! dirbatch Table Reconciler
//!
//! Flat record store derived from a [`DirectoryTree`](dirbatch_tree::DirectoryTree)
//! and reconciliation of that store against an external CSV table.
//!
//! # Example
//!
//! ```no_run
//! use dirbatch_status::StatusChain;
//! use dirbatch_table::{Reconciler, RecordStore, TableMap};
//! # fn run(tree: &mut dirbatch_tree::DirectoryTree) -> Result<(), dirbatch_table::TableError> {
//! let mut chain = StatusChain::new();
//! let mut store = RecordStore::from_tree(tree)?;
//! let outcome = Reconciler::new(vec![TableMap::new("period", "T")])
//!     .reconcile_file("runs.csv".as_ref(), tree, &mut store, &mut chain)?;
//! println!("{} matched", outcome.matched.len());
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod error;
pub mod loader;
pub mod reconcile;
pub mod record;
pub mod status;
pub mod writer;

// Re-exports
pub use error::TableError;
pub use loader::{load_table, KeyColumn, Table, TableMap, TableRow};
pub use reconcile::{Reconciler, Reconciliation, ORPHAN_DIRECTORIES, ORPHAN_TABLE_ROWS};
pub use record::{Record, RecordSource, RecordStore};
pub use status::MatchStatus;
pub use writer::{status_cell, write_records, ID_COLUMN, STATUS_COLUMN};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
