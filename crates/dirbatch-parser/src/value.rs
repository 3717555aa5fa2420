//! Typed values decoded from directory names
//!
//! Provides [`Value`], its declared [`ValueType`], the exact-comparison
//! [`MatchKey`], and the [`Attributes`] bag a parser returns for one name.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Declared type of a directory level or table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed integer
    Int,
    /// Decimal number, compared through its fixed-point encoding
    Float,
    /// Free text
    Text,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Text => write!(f, "text"),
        }
    }
}

/// A decoded parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value
    Int(i64),
    /// Decimal value
    Float(f64),
    /// Text value
    Text(String),
}

impl Value {
    /// Type tag of this value
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
        }
    }

    /// Integer payload, if any
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric payload widened to `f64`
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Text payload, if any
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a raw table cell as the declared type
    ///
    /// Returns `None` when the cell cannot be read as `ty`.
    #[must_use]
    pub fn parse_as(raw: &str, ty: ValueType) -> Option<Self> {
        let raw = raw.trim();
        match ty {
            ValueType::Int => raw.parse::<i64>().ok().map(Value::Int),
            ValueType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Value::Float),
            ValueType::Text => Some(Value::Text(raw.to_string())),
        }
    }

    /// Total ordering used for sorting record tables
    ///
    /// Numbers compare numerically with each other and sort before text.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Text(_), _) => Ordering::Greater,
            (_, Value::Text(_)) => Ordering::Less,
            (a, b) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Exact-comparison form of a key value
///
/// Floating-point keys are never compared by decoded value; they are
/// carried as their fixed-point integer encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    /// Integer key
    Int(i64),
    /// Fixed-point encoded decimal key
    Fixed(i64),
    /// Text key
    Text(String),
}

impl Display for MatchKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MatchKey::Int(v) | MatchKey::Fixed(v) => write!(f, "{v}"),
            MatchKey::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Disambiguating suffix split off a directory name
///
/// Presence of a suffix is the "virtual" tag that makes the tree builder
/// insert an extra level.
#[derive(Debug, Clone, PartialEq)]
pub struct Suffix {
    /// Attribute name of the suffix (e.g. `jobid`)
    pub name: String,
    /// Decoded suffix value
    pub value: Value,
}

impl Suffix {
    /// Create new suffix
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Attribute bag produced by a parser for one directory name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<String, Value>,
    suffix: Option<Suffix>,
}

impl Attributes {
    /// Create empty attribute bag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute bag holding a single value
    #[must_use]
    pub fn single(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut attrs = Self::new();
        attrs.insert(key, value);
        attrs
    }

    /// Attach a virtual suffix
    #[inline]
    #[must_use]
    pub fn with_suffix(mut self, suffix: Suffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Iterate over values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Virtual suffix, if the name carried one
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> Option<&Suffix> {
        self.suffix.as_ref()
    }

    /// Detach and return the suffix
    pub fn take_suffix(&mut self) -> Option<Suffix> {
        self.suffix.take()
    }

    /// Whether the name carried a virtual suffix
    #[inline]
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.suffix.is_some()
    }

    /// Number of values (suffix excluded)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
