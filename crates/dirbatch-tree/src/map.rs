//! Directory maps
//!
//! One [`DirectoryMap`] per nesting level declares the attribute name, the
//! token the parser looks for, and the parser itself.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use dirbatch_parser::{NameParser, ValueType};

/// Declaration of one nesting level
#[derive(Clone)]
pub struct DirectoryMap {
    name: String,
    token: String,
    parser: Arc<dyn NameParser>,
}

impl DirectoryMap {
    /// Create map whose token equals its name
    pub fn new(name: impl Into<String>, parser: impl NameParser + 'static) -> Self {
        let name = name.into();
        Self {
            token: name.clone(),
            name,
            parser: Arc::new(parser),
        }
    }

    /// Create map from a shared parser
    pub fn from_shared(name: impl Into<String>, parser: Arc<dyn NameParser>) -> Self {
        let name = name.into();
        Self {
            token: name.clone(),
            name,
            parser,
        }
    }

    /// Set the token matched in directory names
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Attribute name of this level
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token matched in directory names
    #[inline]
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Parser for this level
    #[inline]
    #[must_use]
    pub fn parser(&self) -> &dyn NameParser {
        self.parser.as_ref()
    }

    /// Declared value type
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.parser.value_type()
    }

    /// Whether names at this level may carry a run suffix
    #[inline]
    #[must_use]
    pub fn has_suffix(&self) -> bool {
        self.parser.has_preprocessor()
    }
}

impl Debug for DirectoryMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryMap")
            .field("name", &self.name)
            .field("token", &self.token)
            .field("value_type", &self.value_type())
            .finish_non_exhaustive()
    }
}
