//! Status chain registry
//!
//! Provides [`StatusChain`], which maps every registered status kind onto a
//! contiguous block of global ids. Blocks are appended in registration
//! order, so the same sequence of observed kinds always yields the same ids.

use std::ops::Range;

use crate::error::RegistryError;
use crate::kind::{StatusKind, StatusValue};

#[derive(Debug, Clone)]
struct Block {
    kind: &'static str,
    start: u32,
    min_rank: u32,
    values: Vec<StatusValue>,
}

impl Block {
    #[allow(clippy::cast_possible_truncation)]
    fn end(&self) -> u32 {
        self.start + self.values.len() as u32
    }

    fn range(&self) -> Range<u32> {
        self.start..self.end()
    }
}

/// Append-only registry of status kinds
#[derive(Debug, Default, Clone)]
pub struct StatusChain {
    blocks: Vec<Block>,
}

impl StatusChain {
    /// Create new empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Register kind `T`
    ///
    /// # Errors
    /// Returns error if `T` is already registered or its ranks are invalid.
    pub fn register<T: StatusKind>(&mut self) -> Result<Range<u32>, RegistryError> {
        if self.contains(T::KIND) {
            return Err(RegistryError::AlreadyRegistered(T::KIND.to_string()));
        }
        self.push(T::KIND, vocabulary::<T>())
    }

    /// Register kind `T` unless it is already present
    ///
    /// # Errors
    /// Returns error if the vocabulary of `T` is invalid.
    pub fn ensure<T: StatusKind>(&mut self) -> Result<Range<u32>, RegistryError> {
        if let Some(block) = self.block(T::KIND) {
            return Ok(block.range());
        }
        self.push(T::KIND, vocabulary::<T>())
    }

    /// Global id of `value`, registering its kind on first sight
    ///
    /// # Errors
    /// Returns error if the value's vocabulary is invalid.
    pub fn observe(&mut self, value: StatusValue) -> Result<u32, RegistryError> {
        if !self.contains(value.kind()) {
            self.push(value.kind(), value.vocabulary())?;
        }
        self.global_id(value)
    }

    fn push(
        &mut self,
        kind: &'static str,
        mut values: Vec<StatusValue>,
    ) -> Result<Range<u32>, RegistryError> {
        values.sort_by_key(StatusValue::rank);
        let Some(min_rank) = values.first().map(StatusValue::rank) else {
            return Err(RegistryError::EmptyVocabulary(kind.to_string()));
        };
        let contiguous = values
            .iter()
            .zip(min_rank..)
            .all(|(v, expected)| v.rank() == expected && v.kind() == kind);
        if !contiguous {
            return Err(RegistryError::InvalidRanks(kind.to_string()));
        }

        let start = self.end();
        let block = Block {
            kind,
            start,
            min_rank,
            values,
        };
        let range = block.range();
        tracing::debug!(
            "Registered status kind '{}' with ids {}..{}",
            kind,
            range.start,
            range.end
        );
        self.blocks.push(block);
        Ok(range)
    }

    /// Whether a kind is registered
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.block(kind).is_some()
    }

    fn block(&self, kind: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == kind)
    }

    /// First unused global id
    #[must_use]
    pub fn end(&self) -> u32 {
        self.blocks.last().map_or(0, Block::end)
    }

    /// Registered kinds in registration order
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.blocks.iter().map(|b| b.kind).collect()
    }

    /// Id range reserved for a kind
    #[must_use]
    pub fn range_of(&self, kind: &str) -> Option<Range<u32>> {
        self.block(kind).map(Block::range)
    }

    /// Global id of a registered value
    ///
    /// # Errors
    /// Returns error if the value's kind is not registered.
    pub fn global_id(&self, value: StatusValue) -> Result<u32, RegistryError> {
        let block = self
            .block(value.kind())
            .ok_or_else(|| RegistryError::UnknownKind(value.kind().to_string()))?;
        Ok(block.start + value.rank().saturating_sub(block.min_rank))
    }

    /// Value for a global id
    ///
    /// # Errors
    /// Returns error if no registered block contains `id`.
    pub fn status(&self, id: u32) -> Result<StatusValue, RegistryError> {
        self.blocks
            .iter()
            .find(|b| b.range().contains(&id))
            .map(|b| b.values[(id - b.start) as usize])
            .ok_or(RegistryError::IdOutOfRange { id, end: self.end() })
    }

    /// Least valid value (maximum global id)
    ///
    /// # Errors
    /// Returns error if any value's kind is not registered.
    pub fn worst<I>(&self, values: I) -> Result<Option<StatusValue>, RegistryError>
    where
        I: IntoIterator<Item = StatusValue>,
    {
        self.extreme(values, |candidate, current| candidate > current)
    }

    /// Most valid value (minimum global id)
    ///
    /// # Errors
    /// Returns error if any value's kind is not registered.
    pub fn best<I>(&self, values: I) -> Result<Option<StatusValue>, RegistryError>
    where
        I: IntoIterator<Item = StatusValue>,
    {
        self.extreme(values, |candidate, current| candidate < current)
    }

    fn extreme<I>(
        &self,
        values: I,
        better: impl Fn(u32, u32) -> bool,
    ) -> Result<Option<StatusValue>, RegistryError>
    where
        I: IntoIterator<Item = StatusValue>,
    {
        let mut picked: Option<(u32, StatusValue)> = None;
        for value in values {
            let id = self.global_id(value)?;
            match picked {
                Some((current, _)) if !better(id, current) => {}
                _ => picked = Some((id, value)),
            }
        }
        Ok(picked.map(|(_, v)| v))
    }

    /// Render `"[<id>] <display>"`
    ///
    /// # Errors
    /// Returns error if the value's kind is not registered.
    pub fn label(&self, value: StatusValue) -> Result<String, RegistryError> {
        Ok(format!("[{}] {}", self.global_id(value)?, value.display()))
    }

    /// Number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no kind is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn vocabulary<T: StatusKind>() -> Vec<StatusValue> {
    T::values().iter().copied().map(StatusValue::of).collect()
}

/// Whether every value is valid
///
/// Stricter than aggregation; used where no invalid descendant is tolerated.
#[must_use]
pub fn all_valid<I: IntoIterator<Item = StatusValue>>(values: I) -> bool {
    values.into_iter().all(|v| v.is_valid())
}

/// Whether at least one value is valid
#[must_use]
pub fn any_valid<I: IntoIterator<Item = StatusValue>>(values: I) -> bool {
    values.into_iter().any(|v| v.is_valid())
}
