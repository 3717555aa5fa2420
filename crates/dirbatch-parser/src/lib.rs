//! dirbatch Parser Framework
//!
//! Bidirectional transforms between directory names and typed parameter
//! values.
//!
//! # Overview
//!
//! - **Validators** strip a literal naming convention (`StartsWith`,
//!   `MatchAt` first/last) and can restore it
//! - **Value parsers** decode the remaining text (`Integer`, `Decimal`,
//!   `Text`); decimals keep a fixed-point integer form for exact comparison
//! - **Preprocessors** split a trailing run suffix (job id) off a name and
//!   tag the result as virtual
//!
//! # Example
//!
//! ```rust
//! use dirbatch_parser::{NameParser, Preprocessor, Validator, ValidatorParser, Value, ValueParser};
//!
//! let parser = ValidatorParser::new(Validator::match_first("_"), ValueParser::decimal(4))
//!     .with_preprocessor(Preprocessor::job_id("_"));
//!
//! let attrs = parser.forward("cd", "cd_0320_jobA").unwrap().unwrap();
//! assert_eq!(attrs.get("cd"), Some(&Value::Float(0.32)));
//! assert_eq!(parser.reverse("cd", &attrs).unwrap(), "cd_0320_jobA");
//! ```

// Core modules
pub mod check;
pub mod error;
pub mod parser;
pub mod validator;
pub mod value;
pub mod value_parser;

// Re-exports
pub use check::{check_parser, ParserCheck};
pub use error::ParserError;
pub use parser::{FnParser, NameParser, Preprocessor, ValidatorParser};
pub use validator::{Position, SplitAt, Validator};
pub use value::{Attributes, MatchKey, Suffix, Value, ValueType};
pub use value_parser::ValueParser;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building directory parsers
    pub use crate::{
        Attributes, NameParser, ParserError, Preprocessor, Validator, ValidatorParser, Value,
        ValueParser, ValueType,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
