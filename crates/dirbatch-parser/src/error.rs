//! Error types for the parser framework
//!
//! A name that simply does not belong to a directory level is not an
//! error; `NameParser::forward` reports it as `Ok(None)`. The variants here
//! cover misuse of a parser composition, which is a programmer error.

use crate::value::ValueType;

/// Errors raised by a parser composition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParserError {
    /// The attribute to encode is absent
    #[error("attribute '{0}' missing from parsed attributes")]
    MissingAttribute(String),

    /// The value has a different type than the parser handles
    #[error("type mismatch: expected {expected} value, got {actual}")]
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },

    /// The value cannot be expressed in the parser's encoding
    #[error("value {value} is not representable: {reason}")]
    Unrepresentable { value: String, reason: String },

    /// A float parser without a fixed-point encoding
    #[error("parser for '{0}' declares no fixed-point encoding")]
    NoFixedPoint(String),

    /// Parser-specific failure
    #[error("parser error: {0}")]
    Custom(String),
}

impl ParserError {
    /// Create type mismatch error
    #[inline]
    #[must_use]
    pub fn type_mismatch(expected: ValueType, actual: ValueType) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    /// Create unrepresentable value error
    pub fn unrepresentable(value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Unrepresentable {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParserError::type_mismatch(ValueType::Int, ValueType::Text);
        assert_eq!(err.to_string(), "type mismatch: expected int value, got text");

        let err = ParserError::MissingAttribute("cd".to_string());
        assert!(err.to_string().contains("'cd'"));
    }
}
