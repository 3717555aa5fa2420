//! Parser diagnostics
//!
//! Runs a sample name through `forward` and `reverse` and reports whether
//! the parser accepts it and restores it unchanged.

use crate::error::ParserError;
use crate::parser::NameParser;
use crate::value::Attributes;

/// Outcome of checking one sample name
#[derive(Debug, Clone, PartialEq)]
pub enum ParserCheck {
    /// The parser rejected the name
    Ignored,
    /// Accepted and restored unchanged
    Success(Attributes),
    /// Accepted but `reverse` produced a different name
    Mismatch {
        /// Sample name
        input: String,
        /// Name produced by `reverse`
        output: String,
    },
    /// A suffix was produced by a level other than the last
    SuffixNotAllowed(Attributes),
}

impl ParserCheck {
    /// Whether the check passed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Check a parser against one sample name
///
/// # Errors
/// Returns error if the parser itself fails (misconfigured composition).
pub fn check_parser(
    parser: &dyn NameParser,
    token: &str,
    raw: &str,
    is_last: bool,
) -> Result<ParserCheck, ParserError> {
    let Some(attrs) = parser.forward(token, raw)? else {
        return Ok(ParserCheck::Ignored);
    };
    if attrs.is_virtual() && !is_last {
        return Ok(ParserCheck::SuffixNotAllowed(attrs));
    }
    let output = parser.reverse(token, &attrs)?;
    if output == raw {
        Ok(ParserCheck::Success(attrs))
    } else {
        Ok(ParserCheck::Mismatch {
            input: raw.to_string(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{FnParser, Preprocessor, ValidatorParser};
    use crate::validator::Validator;
    use crate::value::{Value, ValueType};
    use crate::value_parser::ValueParser;

    #[test]
    fn check_outcomes() {
        let p = ValidatorParser::starts_with(ValueParser::integer());
        assert!(check_parser(&p, "period", "period100", true)
            .unwrap()
            .is_success());
        assert_eq!(
            check_parser(&p, "period", "depth5", true).unwrap(),
            ParserCheck::Ignored
        );
    }

    #[test]
    fn suffix_on_inner_level() {
        let p = ValidatorParser::new(Validator::match_first("_"), ValueParser::decimal(4))
            .with_preprocessor(Preprocessor::job_id("_"));
        assert!(matches!(
            check_parser(&p, "cd", "cd_0320_jobA", false).unwrap(),
            ParserCheck::SuffixNotAllowed(_)
        ));
        assert!(check_parser(&p, "cd", "cd_0320_jobA", true)
            .unwrap()
            .is_success());
    }

    #[test]
    fn lossy_closure_pair_is_reported() {
        // Lower-cases on the way in, so upper-case samples do not survive.
        let p = FnParser::new(
            ValueType::Text,
            |token: &str, raw: &str| Some(Attributes::single(token, raw.to_lowercase())),
            |token: &str, attrs: &Attributes| attrs.get(token).map(Value::to_string),
        );
        assert_eq!(
            check_parser(&p, "case", "Wave", true).unwrap(),
            ParserCheck::Mismatch {
                input: "Wave".into(),
                output: "wave".into(),
            }
        );
    }
}
