//! Name validators
//!
//! A validator checks that a raw directory name follows a literal naming
//! convention and strips it, leaving the value text for a
//! [`ValueParser`](crate::ValueParser). Every validator can restore the
//! convention, so `restore(token, strip(token, raw)?) == raw`.

use serde::{Deserialize, Serialize};

/// Which end of a delimited name a validator works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// First delimited component
    First,
    /// Last delimited component
    #[default]
    Last,
}

/// Literal naming convention for one directory level
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Validator {
    /// `"<token><value>"`, e.g. `period100`
    #[default]
    StartsWith,
    /// `"<token><delim><value>"` (first) or `"<value><delim><token>"` (last)
    MatchAt {
        /// Component that must equal the token
        position: Position,
        /// Component delimiter
        delimiter: String,
    },
}

impl Validator {
    /// Prefix validator
    #[inline]
    #[must_use]
    pub fn starts_with() -> Self {
        Self::StartsWith
    }

    /// Token must be the first delimited component
    #[inline]
    #[must_use]
    pub fn match_first(delimiter: impl Into<String>) -> Self {
        Self::MatchAt {
            position: Position::First,
            delimiter: delimiter.into(),
        }
    }

    /// Token must be the last delimited component
    #[inline]
    #[must_use]
    pub fn match_last(delimiter: impl Into<String>) -> Self {
        Self::MatchAt {
            position: Position::Last,
            delimiter: delimiter.into(),
        }
    }

    /// Strip the convention, returning the value text
    ///
    /// Returns `None` if `raw` does not follow the convention for `token`.
    #[must_use]
    pub fn strip(&self, token: &str, raw: &str) -> Option<String> {
        match self {
            Self::StartsWith => raw.strip_prefix(token).map(str::to_string),
            Self::MatchAt {
                position: Position::First,
                delimiter,
            } => {
                let (first, rest) = raw.split_once(delimiter.as_str())?;
                (first == token).then(|| rest.to_string())
            }
            Self::MatchAt {
                position: Position::Last,
                delimiter,
            } => {
                let (rest, last) = raw.rsplit_once(delimiter.as_str())?;
                (last == token).then(|| rest.to_string())
            }
        }
    }

    /// Re-apply the convention to value text
    #[must_use]
    pub fn restore(&self, token: &str, rest: &str) -> String {
        match self {
            Self::StartsWith => format!("{token}{rest}"),
            Self::MatchAt {
                position: Position::First,
                delimiter,
            } => format!("{token}{delimiter}{rest}"),
            Self::MatchAt {
                position: Position::Last,
                delimiter,
            } => format!("{rest}{delimiter}{token}"),
        }
    }
}

/// Splits a name into a kept part and a split-off component
///
/// Used by preprocessors to peel a trailing (or leading) run identifier
/// off a name before the level's own validator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAt {
    position: Position,
    delimiter: String,
}

impl SplitAt {
    /// Split off the last delimited component
    #[inline]
    #[must_use]
    pub fn last(delimiter: impl Into<String>) -> Self {
        Self {
            position: Position::Last,
            delimiter: delimiter.into(),
        }
    }

    /// Split off the first delimited component
    #[inline]
    #[must_use]
    pub fn first(delimiter: impl Into<String>) -> Self {
        Self {
            position: Position::First,
            delimiter: delimiter.into(),
        }
    }

    /// Delimiter in use
    #[inline]
    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split `raw` into `(kept, split_off)`
    ///
    /// Both parts must be non-empty.
    #[must_use]
    pub fn split(&self, raw: &str) -> Option<(String, String)> {
        let (kept, split_off) = match self.position {
            Position::Last => raw.rsplit_once(self.delimiter.as_str())?,
            Position::First => {
                let (head, tail) = raw.split_once(self.delimiter.as_str())?;
                (tail, head)
            }
        };
        if kept.is_empty() || split_off.is_empty() {
            return None;
        }
        Some((kept.to_string(), split_off.to_string()))
    }

    /// Inverse of [`split`](Self::split)
    #[must_use]
    pub fn join(&self, kept: &str, split_off: &str) -> String {
        match self.position {
            Position::Last => format!("{kept}{}{split_off}", self.delimiter),
            Position::First => format!("{split_off}{}{kept}", self.delimiter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_strip_and_restore() {
        let v = Validator::starts_with();
        assert_eq!(v.strip("period", "period100").as_deref(), Some("100"));
        assert_eq!(v.strip("period", "depth5"), None);
        assert_eq!(v.restore("period", "100"), "period100");
    }

    #[test]
    fn match_first_requires_delimiter() {
        let v = Validator::match_first("_");
        assert_eq!(v.strip("cd", "cd_0320").as_deref(), Some("0320"));
        assert_eq!(v.strip("cd", "cd_0320_x").as_deref(), Some("0320_x"));
        assert_eq!(v.strip("cd", "cd"), None);
        assert_eq!(v.strip("cd", "m_0320"), None);
        assert_eq!(v.restore("cd", "0320"), "cd_0320");
    }

    #[test]
    fn match_last_uses_final_component() {
        let v = Validator::match_last("-");
        assert_eq!(v.strip("hz", "50-hz").as_deref(), Some("50"));
        assert_eq!(v.strip("hz", "50-khz"), None);
        assert_eq!(v.restore("hz", "50"), "50-hz");
    }

    #[test]
    fn split_at_last() {
        let s = SplitAt::last("_");
        assert_eq!(
            s.split("cd_0320_jobA"),
            Some(("cd_0320".to_string(), "jobA".to_string()))
        );
        assert_eq!(s.split("cd0320"), None);
        assert_eq!(s.split("cd_"), None);
        assert_eq!(s.join("cd_0320", "jobA"), "cd_0320_jobA");
    }

    #[test]
    fn split_at_first() {
        let s = SplitAt::first("_");
        assert_eq!(
            s.split("run7_cd_0320"),
            Some(("cd_0320".to_string(), "run7".to_string()))
        );
        assert_eq!(s.join("cd_0320", "run7"), "run7_cd_0320");
    }
}
