//! Record store
//!
//! [`RecordStore`] holds one [`Record`] per complete leaf or table-only key
//! tuple. Ids are assigned monotonically and never reused; records are
//! updated in place and never removed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use dirbatch_parser::Value;
use dirbatch_status::{StatusChain, StatusValue};
use dirbatch_tree::{DirectoryTree, LeafRecord, NodeId, NodeSource};
use indexmap::IndexMap;

use crate::error::TableError;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSource {
    /// Complete leaf found on disk
    Filesystem,
    /// Table-only row with a synthesized tree node
    Synthesized,
    /// Table-only row that could not be placed in the tree
    Table,
}

impl Display for RecordSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filesystem => write!(f, "filesystem"),
            Self::Synthesized => write!(f, "synthesized"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// One flat parameter record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique id, never reused
    pub id: u64,
    /// Key columns first, then extra columns
    pub values: IndexMap<String, Value>,
    /// Current status
    pub status: StatusValue,
    /// Free-form note rendered after the status label
    pub message: Option<String>,
    /// Whether the record is still eligible for further work
    pub valid: bool,
    /// Origin of the record
    pub source: RecordSource,
    /// Directory of the record, `None` when it has none on disk
    pub path: Option<PathBuf>,
    /// Linked tree leaf
    pub node: Option<NodeId>,
}

impl Record {
    /// Look up a column value
    #[inline]
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set status, deriving validity from it
    pub fn set_status(&mut self, status: StatusValue, message: Option<String>) {
        self.status = status;
        self.valid = status.is_valid();
        self.message = message;
    }
}

/// Ordered, id-addressed collection of records
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    keys: Vec<String>,
    records: Vec<Record>,
    index: HashMap<u64, usize>,
    next_id: u64,
}

impl RecordStore {
    /// Create empty store keyed by the given columns
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            records: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }

    /// Build a store from the tree's complete leaves and link ids back
    ///
    /// # Errors
    /// Returns error if the tree rejects a record link.
    pub fn from_tree(tree: &mut DirectoryTree) -> Result<Self, TableError> {
        let keys = tree.maps().iter().map(|m| m.name().to_string()).collect();
        let mut store = Self::new(keys);
        for leaf in tree.leaf_records() {
            let node = leaf.node;
            let id = store.insert_leaf(leaf);
            tree.assign_record(node, id)?;
        }
        tracing::info!("Record store built from {} directory leaves", store.len());
        Ok(store)
    }

    fn insert_leaf(&mut self, leaf: LeafRecord) -> u64 {
        let source = match leaf.source {
            NodeSource::Synthesized => RecordSource::Synthesized,
            NodeSource::Filesystem | NodeSource::Virtual => RecordSource::Filesystem,
        };
        let values = leaf.values.into_iter().collect();
        self.insert(values, leaf.status, source, leaf.path, Some(leaf.node))
    }

    /// Add a record with a fresh id
    pub fn insert(
        &mut self,
        values: IndexMap<String, Value>,
        status: StatusValue,
        source: RecordSource,
        path: Option<PathBuf>,
        node: Option<NodeId>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.index.insert(id, self.records.len());
        self.records.push(Record {
            id,
            values,
            status,
            message: None,
            valid: status.is_valid(),
            source,
            path,
            node,
        });
        id
    }

    /// Key column names
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Key tuple of a record, in key column order
    #[must_use]
    pub fn key_of(&self, record: &Record) -> Vec<Value> {
        self.keys
            .iter()
            .filter_map(|k| record.values.get(k).cloned())
            .collect()
    }

    /// Id the next insert will receive
    #[inline]
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Look up a record
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.index.get(&id).map(|&at| &self.records[at])
    }

    /// Look up a record for update
    ///
    /// # Errors
    /// Returns error if no record has this id.
    pub fn get_mut(&mut self, id: u64) -> Result<&mut Record, TableError> {
        let at = *self.index.get(&id).ok_or(TableError::UnknownRecord(id))?;
        Ok(&mut self.records[at])
    }

    /// Records in current order
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Records still eligible for work
    pub fn valid(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.valid)
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extra (non-key) columns in first-seen order
    #[must_use]
    pub fn extra_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in &self.records {
            for name in record.values.keys() {
                if !self.keys.contains(name) && !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        columns
    }

    /// Sort by key columns, then by global status id
    ///
    /// # Errors
    /// Returns error if a record's status kind is not registered.
    pub fn sort(&mut self, chain: &StatusChain) -> Result<(), TableError> {
        let mut ranks = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            ranks.insert(record.id, chain.global_id(record.status)?);
        }
        let keys = &self.keys;
        self.records.sort_by(|a, b| {
            keys.iter()
                .map(|k| compare_cells(a.values.get(k), b.values.get(k)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
                .then_with(|| ranks[&a.id].cmp(&ranks[&b.id]))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(at, r)| (r.id, at))
            .collect();
        Ok(())
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::MatchStatus;
    use dirbatch_status::TreeStatus;

    fn row(period: i64, cd: f64) -> IndexMap<String, Value> {
        let mut values = IndexMap::new();
        values.insert("period".to_string(), Value::Int(period));
        values.insert("cd".to_string(), Value::Float(cd));
        values
    }

    fn add(
        store: &mut RecordStore,
        values: IndexMap<String, Value>,
        status: impl Into<StatusValue>,
        source: RecordSource,
    ) -> u64 {
        store.insert(values, status.into(), source, None, None)
    }

    #[test]
    fn ids_are_monotonic() {
        let mut store = RecordStore::new(vec!["period".into(), "cd".into()]);
        let a = add(&mut store, row(1, 0.1), TreeStatus::Valid, RecordSource::Filesystem);
        let b = add(&mut store, row(2, 0.1), TreeStatus::Valid, RecordSource::Filesystem);
        assert_eq!((a, b), (0, 1));
        assert_eq!(store.next_id(), 2);
        assert!(store.get_mut(9).is_err());
        assert!(store.get(9).is_none());
    }

    #[test]
    fn sorts_by_keys_then_status() {
        let mut chain = StatusChain::new();
        chain.ensure::<TreeStatus>().unwrap();
        chain.ensure::<MatchStatus>().unwrap();

        let mut store = RecordStore::new(vec!["period".into(), "cd".into()]);
        add(&mut store, row(2, 0.1), TreeStatus::Valid, RecordSource::Filesystem);
        add(&mut store, row(1, 0.2), MatchStatus::TableOnly, RecordSource::Table);
        add(&mut store, row(1, 0.2), MatchStatus::Matched, RecordSource::Filesystem);
        add(&mut store, row(1, 0.1), TreeStatus::Invalid, RecordSource::Filesystem);
        store.sort(&chain).unwrap();

        let order: Vec<u64> = store.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![3, 2, 1, 0]);
    }

    #[test]
    fn lookups_follow_records_through_a_sort() {
        let mut chain = StatusChain::new();
        chain.ensure::<TreeStatus>().unwrap();

        let mut store = RecordStore::new(vec!["period".into()]);
        for period in [3, 1, 2] {
            add(&mut store, row(period, 0.1), TreeStatus::Valid, RecordSource::Filesystem);
        }
        store.sort(&chain).unwrap();

        for (id, period) in [(0, 3), (1, 1), (2, 2)] {
            assert_eq!(store.get(id).unwrap().get("period"), Some(&Value::Int(period)));
        }
        store.get_mut(1).unwrap().values.insert("runtime".into(), Value::Int(7));
        assert_eq!(store.iter().next().unwrap().get("runtime"), Some(&Value::Int(7)));
    }

    #[test]
    fn status_drives_validity() {
        let mut store = RecordStore::new(vec!["period".into()]);
        let id = add(&mut store, row(1, 0.1), TreeStatus::Valid, RecordSource::Filesystem);
        store
            .get_mut(id)
            .unwrap()
            .set_status(MatchStatus::DirectoryOnly.into(), Some("note".into()));
        assert_eq!(store.valid().count(), 0);
        assert_eq!(store.extra_columns(), vec!["cd".to_string()]);
    }
}
