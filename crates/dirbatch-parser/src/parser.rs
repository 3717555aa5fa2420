//! Bidirectional name parsers
//!
//! A [`NameParser`] turns one directory name into an [`Attributes`] bag
//! (`forward`) and renders the bag back into the name (`reverse`). For every
//! name a parser accepts, `reverse(forward(x)) == x`.
//!
//! The stock composition is [`ValidatorParser`]: an optional
//! [`Preprocessor`] peels a run suffix off the name, a [`Validator`] strips
//! the level's naming convention, and a [`ValueParser`] decodes what is left.
//! Application-specific conventions can be expressed as a [`FnParser`].

use std::fmt::{self, Debug, Formatter};

use crate::error::ParserError;
use crate::validator::{SplitAt, Validator};
use crate::value::{Attributes, MatchKey, Suffix, Value, ValueType};
use crate::value_parser::ValueParser;

/// A reversible directory-name parser
///
/// `forward` returns `Ok(None)` when a name does not belong to the level.
/// `Err` is reserved for a broken parser composition.
pub trait NameParser: Debug + Send + Sync {
    /// Decode `raw` for the level whose attribute is named `token`
    ///
    /// # Errors
    /// Returns error only if the parser itself is misconfigured.
    fn forward(&self, token: &str, raw: &str) -> Result<Option<Attributes>, ParserError>;

    /// Render attributes back into a directory name
    ///
    /// Without a suffix in `attrs` this produces the canonical name used
    /// for synthesized nodes.
    ///
    /// # Errors
    /// Returns error if `attrs` lacks the level's value or holds a value
    /// the parser cannot encode.
    fn reverse(&self, token: &str, attrs: &Attributes) -> Result<String, ParserError>;

    /// Declared type of the level's value
    fn value_type(&self) -> ValueType;

    /// Whether names may carry a split-off run suffix
    fn has_preprocessor(&self) -> bool {
        false
    }

    /// Exact-comparison key for a value at this level
    ///
    /// # Errors
    /// The default cannot compare floats exactly and rejects them.
    fn match_key(&self, value: &Value) -> Result<MatchKey, ParserError> {
        match value {
            Value::Int(v) => Ok(MatchKey::Int(*v)),
            Value::Text(s) => Ok(MatchKey::Text(s.clone())),
            Value::Float(_) => Err(ParserError::NoFixedPoint(format!("{self:?}"))),
        }
    }
}

/// Splits and decodes a run suffix before the main validator runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessor {
    splitter: SplitAt,
    parser: ValueParser,
    name: String,
}

impl Preprocessor {
    /// Create new preprocessor
    #[must_use]
    pub fn new(splitter: SplitAt, parser: ValueParser, name: impl Into<String>) -> Self {
        Self {
            splitter,
            parser,
            name: name.into(),
        }
    }

    /// Trailing text job identifier named `jobid`
    #[must_use]
    pub fn job_id(delimiter: impl Into<String>) -> Self {
        Self::new(SplitAt::last(delimiter), ValueParser::text(), "jobid")
    }

    /// Trailing component decoded by `parser` and named `name`
    #[must_use]
    pub fn split_at_last(
        name: impl Into<String>,
        parser: ValueParser,
        delimiter: impl Into<String>,
    ) -> Self {
        Self::new(SplitAt::last(delimiter), parser, name)
    }

    /// Attribute name of the suffix
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split `raw` into the kept name and the decoded suffix
    #[must_use]
    pub fn forward(&self, raw: &str) -> Option<(String, Suffix)> {
        let (kept, split_off) = self.splitter.split(raw)?;
        let value = self.parser.decode(&split_off)?;
        Some((kept, Suffix::new(self.name.clone(), value)))
    }

    /// Re-attach an encoded suffix to the kept name
    ///
    /// # Errors
    /// Returns error if the suffix value cannot be encoded.
    pub fn reverse(&self, kept: &str, suffix: &Suffix) -> Result<String, ParserError> {
        let split_off = self.parser.encode(&suffix.value)?;
        Ok(self.splitter.join(kept, &split_off))
    }
}

/// Validator, value parser and optional preprocessor composed into one parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorParser {
    validator: Validator,
    parser: ValueParser,
    preprocessor: Option<Preprocessor>,
}

impl ValidatorParser {
    /// Create new parser
    #[inline]
    #[must_use]
    pub fn new(validator: Validator, parser: ValueParser) -> Self {
        Self {
            validator,
            parser,
            preprocessor: None,
        }
    }

    /// Prefix convention (`<token><value>`)
    #[inline]
    #[must_use]
    pub fn starts_with(parser: ValueParser) -> Self {
        Self::new(Validator::starts_with(), parser)
    }

    /// Add a suffix preprocessor
    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    /// Value parser in use
    #[inline]
    #[must_use]
    pub fn value_parser(&self) -> &ValueParser {
        &self.parser
    }

    fn decode(&self, token: &str, raw: &str) -> Option<Attributes> {
        let rest = self.validator.strip(token, raw)?;
        let value = self.parser.decode(&rest)?;
        Some(Attributes::single(token, value))
    }
}

impl NameParser for ValidatorParser {
    fn forward(&self, token: &str, raw: &str) -> Result<Option<Attributes>, ParserError> {
        if let Some(pre) = &self.preprocessor {
            if let Some((kept, suffix)) = pre.forward(raw) {
                if let Some(attrs) = self.decode(token, &kept) {
                    return Ok(Some(attrs.with_suffix(suffix)));
                }
            }
        }
        // A name without a suffix is still accepted so that mixed siblings
        // can be detected by the tree builder.
        Ok(self.decode(token, raw))
    }

    fn reverse(&self, token: &str, attrs: &Attributes) -> Result<String, ParserError> {
        let value = attrs
            .get(token)
            .ok_or_else(|| ParserError::MissingAttribute(token.to_string()))?;
        let name = self.validator.restore(token, &self.parser.encode(value)?);
        match (attrs.suffix(), &self.preprocessor) {
            (None, _) => Ok(name),
            (Some(suffix), Some(pre)) => pre.reverse(&name, suffix),
            (Some(suffix), None) => Err(ParserError::Custom(format!(
                "suffix '{}' given to a parser without preprocessor",
                suffix.name
            ))),
        }
    }

    fn value_type(&self) -> ValueType {
        self.parser.value_type()
    }

    fn has_preprocessor(&self) -> bool {
        self.preprocessor.is_some()
    }

    fn match_key(&self, value: &Value) -> Result<MatchKey, ParserError> {
        self.parser.match_key(value)
    }
}

/// Parser built from a forward/reverse closure pair
pub struct FnParser<F, R> {
    forward: F,
    reverse: R,
    value_type: ValueType,
    exponent: Option<i32>,
    suffix: bool,
}

impl<F, R> FnParser<F, R>
where
    F: Fn(&str, &str) -> Option<Attributes> + Send + Sync,
    R: Fn(&str, &Attributes) -> Option<String> + Send + Sync,
{
    /// Wrap a closure pair
    ///
    /// The caller is responsible for the pair being mutually inverse.
    pub fn new(value_type: ValueType, forward: F, reverse: R) -> Self {
        Self {
            forward,
            reverse,
            value_type,
            exponent: None,
            suffix: false,
        }
    }

    /// Compare float values through `round(x * 10^exponent)`
    #[must_use]
    pub fn with_fixed_point(mut self, exponent: i32) -> Self {
        self.exponent = Some(exponent);
        self
    }

    /// Declare that `forward` may attach a run suffix
    #[must_use]
    pub fn with_suffix(mut self) -> Self {
        self.suffix = true;
        self
    }
}

impl<F, R> Debug for FnParser<F, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnParser")
            .field("value_type", &self.value_type)
            .field("exponent", &self.exponent)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

impl<F, R> NameParser for FnParser<F, R>
where
    F: Fn(&str, &str) -> Option<Attributes> + Send + Sync,
    R: Fn(&str, &Attributes) -> Option<String> + Send + Sync,
{
    fn forward(&self, token: &str, raw: &str) -> Result<Option<Attributes>, ParserError> {
        Ok((self.forward)(token, raw))
    }

    fn reverse(&self, token: &str, attrs: &Attributes) -> Result<String, ParserError> {
        (self.reverse)(token, attrs).ok_or_else(|| {
            ParserError::Custom(format!("cannot render attributes for '{token}'"))
        })
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn has_preprocessor(&self) -> bool {
        self.suffix
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn match_key(&self, value: &Value) -> Result<MatchKey, ParserError> {
        match (value, self.exponent) {
            (Value::Float(_), Some(exponent)) => {
                let scaled = value.as_f64().unwrap_or(f64::NAN) * 10f64.powi(exponent);
                let scaled = scaled.round();
                if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
                    return Err(ParserError::unrepresentable(value, "outside fixed-point range"));
                }
                Ok(MatchKey::Fixed(scaled as i64))
            }
            (Value::Int(v), _) => Ok(MatchKey::Int(*v)),
            (Value::Text(s), _) => Ok(MatchKey::Text(s.clone())),
            (Value::Float(_), None) => Err(ParserError::NoFixedPoint(format!("{self:?}"))),
        }
    }
}
