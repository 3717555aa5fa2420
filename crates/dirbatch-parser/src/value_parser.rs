//! Value parsers
//!
//! Convert the value text left over by a validator into a typed [`Value`]
//! and back. Decoding only accepts text that encodes back to exactly the same
//! string, so the round-trip law holds by construction.

use crate::error::ParserError;
use crate::value::{MatchKey, Value, ValueType};

/// Converter between value text and typed values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueParser {
    /// Integer, zero-padded to `width` digits when `width > 0`
    Integer {
        /// Minimum rendered width (0 = natural width)
        width: usize,
        /// Negate on decode and encode
        flip_sign: bool,
    },
    /// Decimal stored as a `digits`-wide integer scaled by
    /// `10^-(digits + offset - 1)`
    Decimal {
        /// Rendered width of the integer mantissa
        digits: usize,
        /// Shift applied to the decimal exponent
        offset: i32,
        /// Negate on decode and encode
        flip_sign: bool,
    },
    /// Raw text, unchanged
    Text,
}

impl ValueParser {
    /// Natural-width integer
    #[inline]
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            width: 0,
            flip_sign: false,
        }
    }

    /// Fixed-digit decimal with no offset
    #[inline]
    #[must_use]
    pub fn decimal(digits: usize) -> Self {
        Self::Decimal {
            digits,
            offset: 0,
            flip_sign: false,
        }
    }

    /// Text passthrough
    #[inline]
    #[must_use]
    pub fn text() -> Self {
        Self::Text
    }

    /// Set zero-padding width (integers only)
    #[must_use]
    pub fn with_width(mut self, new_width: usize) -> Self {
        if let Self::Integer { width, .. } = &mut self {
            *width = new_width;
        }
        self
    }

    /// Set decimal exponent offset (decimals only)
    #[must_use]
    pub fn with_offset(mut self, new_offset: i32) -> Self {
        if let Self::Decimal { offset, .. } = &mut self {
            *offset = new_offset;
        }
        self
    }

    /// Negate values on decode and encode
    #[must_use]
    pub fn flipped(mut self) -> Self {
        match &mut self {
            Self::Integer { flip_sign, .. } | Self::Decimal { flip_sign, .. } => *flip_sign = true,
            Self::Text => {}
        }
        self
    }

    /// Declared value type
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer { .. } => ValueType::Int,
            Self::Decimal { .. } => ValueType::Float,
            Self::Text => ValueType::Text,
        }
    }

    /// Decimal exponent `digits + offset - 1`, if this is a decimal parser
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn exponent(&self) -> Option<i32> {
        match self {
            Self::Decimal { digits, offset, .. } => Some(*digits as i32 + offset - 1),
            _ => None,
        }
    }

    /// Decode value text
    ///
    /// Returns `None` for text this parser does not accept, including text
    /// that would not re-encode to itself (e.g. unpadded digits).
    #[must_use]
    pub fn decode(&self, raw: &str) -> Option<Value> {
        if raw.is_empty() {
            return None;
        }
        let value = match self {
            Self::Integer { flip_sign, .. } => {
                let parsed = raw.parse::<i64>().ok()?;
                Value::Int(apply_sign(parsed, *flip_sign)?)
            }
            Self::Decimal { flip_sign, .. } => {
                let mantissa = apply_sign(raw.parse::<i64>().ok()?, *flip_sign)?;
                Value::Float(scale_down(mantissa, self.exponent()?))
            }
            Self::Text => Value::Text(raw.to_string()),
        };
        match self.encode(&value) {
            Ok(encoded) if encoded == raw => Some(value),
            _ => None,
        }
    }

    /// Encode a typed value back to value text
    ///
    /// # Errors
    /// Returns error if the value type does not match or the value has no
    /// fixed-point representation.
    pub fn encode(&self, value: &Value) -> Result<String, ParserError> {
        match self {
            Self::Integer { width, flip_sign } => {
                let v = value
                    .as_i64()
                    .ok_or_else(|| ParserError::type_mismatch(ValueType::Int, value.value_type()))?;
                let v = apply_sign(v, *flip_sign)
                    .ok_or_else(|| ParserError::unrepresentable(v, "sign flip overflows"))?;
                Ok(format!("{v:0width$}", width = *width))
            }
            Self::Decimal { digits, .. } => {
                let mantissa = self.fixed_point(value)?;
                Ok(format!("{mantissa:0width$}", width = *digits))
            }
            Self::Text => value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| ParserError::type_mismatch(ValueType::Text, value.value_type())),
        }
    }

    /// Canonical fixed-point integer of a decimal value
    ///
    /// This is the integer the directory name carries, e.g. `0.32` with four
    /// digits is `320`. Values are rounded to the nearest unit.
    ///
    /// # Errors
    /// Returns error for non-decimal parsers, non-numeric values, and values
    /// outside the `i64` range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn fixed_point(&self, value: &Value) -> Result<i64, ParserError> {
        let Self::Decimal { flip_sign, .. } = self else {
            return Err(ParserError::NoFixedPoint(self.value_type().to_string()));
        };
        let exponent = self.exponent().unwrap_or_default();
        let x = value
            .as_f64()
            .ok_or_else(|| ParserError::type_mismatch(ValueType::Float, value.value_type()))?;
        let sign = if *flip_sign { -1.0 } else { 1.0 };
        let scaled = (sign * x * 10f64.powi(exponent)).round();
        let in_range = scaled.is_finite() && scaled.abs() < i64::MAX as f64;
        if !in_range {
            return Err(ParserError::unrepresentable(x, "outside fixed-point range"));
        }
        Ok(scaled as i64)
    }

    /// Exact-comparison key for a value of this parser's type
    ///
    /// # Errors
    /// Returns error if the value does not fit this parser's type.
    pub fn match_key(&self, value: &Value) -> Result<MatchKey, ParserError> {
        match self {
            Self::Integer { .. } => value
                .as_i64()
                .map(MatchKey::Int)
                .ok_or_else(|| ParserError::type_mismatch(ValueType::Int, value.value_type())),
            Self::Decimal { .. } => self.fixed_point(value).map(MatchKey::Fixed),
            Self::Text => value
                .as_str()
                .map(|s| MatchKey::Text(s.to_string()))
                .ok_or_else(|| ParserError::type_mismatch(ValueType::Text, value.value_type())),
        }
    }
}

fn apply_sign(v: i64, flip: bool) -> Option<i64> {
    if flip {
        v.checked_neg()
    } else {
        Some(v)
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale_down(mantissa: i64, exponent: i32) -> f64 {
    // Division by an exact power of ten rounds correctly; multiplying by
    // its reciprocal does not.
    if exponent >= 0 {
        mantissa as f64 / 10f64.powi(exponent)
    } else {
        mantissa as f64 * 10f64.powi(-exponent)
    }
}
