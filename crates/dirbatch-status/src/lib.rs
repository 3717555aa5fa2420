//! dirbatch Status Chain Registry
//!
//! Ranks independent, closed status vocabularies together in one numeric
//! space.
//!
//! Each [`StatusKind`] reserves the next contiguous block of global ids the
//! first time it is registered or observed. Id 0 of each block is the kind's
//! most valid value, so a larger global id always means "less valid" within
//! a kind and "registered later" across kinds.
//!
//! # Example
//!
//! ```rust
//! use dirbatch_status::{StatusChain, StatusValue, TreeStatus};
//!
//! let mut chain = StatusChain::new();
//! chain.ensure::<TreeStatus>().unwrap();
//!
//! let children = [TreeStatus::Valid, TreeStatus::Invalid, TreeStatus::Partial]
//!     .map(StatusValue::of);
//! let composite = chain.worst(children).unwrap().unwrap();
//! assert_eq!(chain.label(composite).unwrap(), "[2] Invalid");
//! ```

// Core modules
pub mod chain;
pub mod error;
pub mod kind;

// Re-exports
pub use chain::{all_valid, any_valid, StatusChain};
pub use error::RegistryError;
pub use kind::{StatusKind, StatusValue, TreeStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
