//! dirbatch Core
//!
//! Orchestrates one batch over a parameter-encoded directory hierarchy:
//! crawl the tree, validate its depth, flatten duplicate runs, build the
//! record store, reconcile it against an external table and write the
//! unified output.
//!
//! # Example
//!
//! ```no_run
//! use dirbatch_core::{Batch, BatchConfig};
//! use dirbatch_parser::{Validator, ValidatorParser, ValueParser};
//!
//! let config = BatchConfig::new("demo", "/data/runs")
//!     .with_directory_map(
//!         "period",
//!         ValidatorParser::new(Validator::match_first("_"), ValueParser::integer()),
//!     )
//!     .with_table("/data/runs.csv");
//! let batch = Batch::open(config)?;
//! for job in batch.pending() {
//!     println!("{} {:?}", job.id, job.path);
//! }
//! # Ok::<(), dirbatch_core::BatchError>(())
//! ```

// Core modules
pub mod banner;
pub mod batch;
pub mod config;
pub mod error;
pub mod layout;

// Re-exports
pub use banner::{banner, banner_lines, BANNER_WIDTH};
pub use batch::{Batch, Pending, RecordUpdate, Summary};
pub use config::{BatchConfig, AGGREGATE_FILE, DEFAULT_OUTPUT};
pub use error::BatchError;
pub use layout::{ColumnSpec, DirectorySpec, LayoutFile, ParserSpec, ValidatorKind, ValueKind};

/// Prelude for common imports
pub mod prelude {
    pub use crate::batch::{Batch, RecordUpdate};
    pub use crate::config::BatchConfig;
    pub use crate::error::BatchError;
    pub use crate::layout::LayoutFile;
    pub use dirbatch_parser::{NameParser, Value};
    pub use dirbatch_status::{StatusChain, StatusKind, StatusValue, TreeStatus};
    pub use dirbatch_table::MatchStatus;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
