//! Status vocabularies
//!
//! A status kind is a small closed set of values ranked from most valid
//! (rank 0) to least valid. [`StatusValue`] is the type-erased form that the
//! tree and table machinery carry around without knowing the vocabulary.

use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// A closed, ranked status vocabulary
pub trait StatusKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// Unique kind tag
    const KIND: &'static str;

    /// Every value of the vocabulary
    fn values() -> &'static [Self];

    /// Local rank, 0 = most valid
    fn rank(self) -> u32;

    /// Human-readable text
    fn display(self) -> &'static str;

    /// Whether the value counts as valid
    fn is_valid(self) -> bool {
        self.rank() == 0
    }
}

/// Type-erased status value
///
/// Two values are equal when they share kind and rank.
#[derive(Clone, Copy)]
pub struct StatusValue {
    kind: &'static str,
    rank: u32,
    display: &'static str,
    valid: bool,
    vocabulary: fn() -> Vec<StatusValue>,
}

impl StatusValue {
    /// Erase a typed status
    #[must_use]
    pub fn of<T: StatusKind>(value: T) -> Self {
        Self {
            kind: T::KIND,
            rank: value.rank(),
            display: value.display(),
            valid: value.is_valid(),
            vocabulary: vocabulary_of::<T>,
        }
    }

    /// Kind tag
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Local rank within the kind
    #[inline]
    #[must_use]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Display text
    #[inline]
    #[must_use]
    pub fn display(&self) -> &'static str {
        self.display
    }

    /// Validity predicate
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Every value of this value's kind
    #[must_use]
    pub fn vocabulary(&self) -> Vec<StatusValue> {
        (self.vocabulary)()
    }

    /// Whether this value belongs to kind `T`
    #[inline]
    #[must_use]
    pub fn is<T: StatusKind>(&self) -> bool {
        self.kind == T::KIND
    }

    /// Recover the typed value
    #[must_use]
    pub fn downcast<T: StatusKind>(&self) -> Option<T> {
        if !self.is::<T>() {
            return None;
        }
        T::values().iter().copied().find(|v| v.rank() == self.rank)
    }
}

fn vocabulary_of<T: StatusKind>() -> Vec<StatusValue> {
    T::values().iter().copied().map(StatusValue::of).collect()
}

impl<T: StatusKind> From<T> for StatusValue {
    fn from(value: T) -> Self {
        Self::of(value)
    }
}

impl PartialEq for StatusValue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.rank == other.rank
    }
}

impl Eq for StatusValue {}

impl Hash for StatusValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.rank.hash(state);
    }
}

impl Debug for StatusValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}({})", self.kind, self.display, self.rank)
    }
}

impl Display for StatusValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.display)
    }
}

/// Generic validity of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeStatus {
    /// Every descendant leaf is valid
    Valid,
    /// Some descendants are valid
    Partial,
    /// Rejected, misplaced or with no valid descendant
    Invalid,
}

impl StatusKind for TreeStatus {
    const KIND: &'static str = "tree";

    fn values() -> &'static [Self] {
        &[Self::Valid, Self::Partial, Self::Invalid]
    }

    fn rank(self) -> u32 {
        match self {
            Self::Valid => 0,
            Self::Partial => 1,
            Self::Invalid => 2,
        }
    }

    fn display(self) -> &'static str {
        match self {
            Self::Valid => "Valid",
            Self::Partial => "Partially",
            Self::Invalid => "Invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erased_value_keeps_vocabulary() {
        let v = StatusValue::of(TreeStatus::Partial);
        assert_eq!(v.kind(), "tree");
        assert_eq!(v.rank(), 1);
        assert!(!v.is_valid());
        assert_eq!(v.vocabulary().len(), 3);
        assert_eq!(v.downcast::<TreeStatus>(), Some(TreeStatus::Partial));
    }

    #[test]
    fn equality_ignores_display() {
        let a: StatusValue = TreeStatus::Valid.into();
        let b = StatusValue::of(TreeStatus::Valid);
        assert_eq!(a, b);
        assert_ne!(a, StatusValue::of(TreeStatus::Invalid));
        assert_eq!(format!("{a:?}"), "tree::Valid(0)");
    }
}
