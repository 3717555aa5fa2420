//! Table reconciliation
//!
//! Matches tree-derived records against an external table by the directory
//! map keys. Floating point keys compare by their fixed-point encoding.
//! Every key tuple of the outer join lands in exactly one partition:
//!
//! - matched: present on both sides
//! - directory-only: present in the tree only
//! - table-only: present in the table only; synthesized back into the tree
//!
//! Synthesized records are not part of the tree side, so reconciling the
//! same table again resolves table-only rows to the records created the
//! first time.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use dirbatch_parser::{MatchKey, Value};
use dirbatch_status::{StatusChain, StatusValue};
use dirbatch_tree::{DirectoryMap, DirectoryTree, TreeError};
use indexmap::IndexMap;

use crate::error::TableError;
use crate::loader::{load_table, KeyColumn, Table, TableMap, TableRow};
use crate::record::{RecordSource, RecordStore};
use crate::status::MatchStatus;
use crate::writer::write_records;

/// Listing of directory-only records
pub const ORPHAN_DIRECTORIES: &str = "orphan_directories.csv";
/// Listing of table-only records
pub const ORPHAN_TABLE_ROWS: &str = "orphan_table_rows.csv";

/// Record ids per partition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Records present on both sides
    pub matched: Vec<u64>,
    /// Records present in the tree only
    pub directory_only: Vec<u64>,
    /// Records present in the table only
    pub table_only: Vec<u64>,
    /// Records created by this pass
    pub created: usize,
}

impl Reconciliation {
    /// Size of the key-tuple union
    #[must_use]
    pub fn total(&self) -> usize {
        self.matched.len() + self.directory_only.len() + self.table_only.len()
    }
}

/// Matches a record store against external tables
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    table_maps: Vec<TableMap>,
    logs_dir: Option<PathBuf>,
}

impl Reconciler {
    /// Create reconciler; maps without a binding use their own name as column
    #[must_use]
    pub fn new(table_maps: Vec<TableMap>) -> Self {
        Self {
            table_maps,
            logs_dir: None,
        }
    }

    /// Write orphan listings into `dir`
    #[must_use]
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = Some(dir.into());
        self
    }

    /// Table bindings
    #[inline]
    #[must_use]
    pub fn table_maps(&self) -> &[TableMap] {
        &self.table_maps
    }

    /// Resolve one key column per directory map
    ///
    /// # Errors
    /// Returns [`TableError::MapMismatch`] if a table map names no directory
    /// map or a directory map is bound twice.
    pub fn key_columns(&self, maps: &[DirectoryMap]) -> Result<Vec<KeyColumn>, TableError> {
        for table_map in &self.table_maps {
            if !maps.iter().any(|m| m.name() == table_map.name()) {
                return Err(TableError::MapMismatch(format!(
                    "table map '{}' has no directory map",
                    table_map.name()
                )));
            }
        }
        maps.iter()
            .map(|map| {
                let mut bound = self.table_maps.iter().filter(|t| t.name() == map.name());
                let column = match (bound.next(), bound.next()) {
                    (Some(_), Some(_)) => {
                        return Err(TableError::MapMismatch(format!(
                            "directory map '{}' is bound to more than one column",
                            map.name()
                        )))
                    }
                    (Some(t), None) => t.column().to_string(),
                    _ => map.name().to_string(),
                };
                Ok(KeyColumn {
                    name: map.name().to_string(),
                    column,
                    value_type: map.value_type(),
                })
            })
            .collect()
    }

    /// Load `path` and reconcile it
    ///
    /// # Errors
    /// Returns error if the table cannot be loaded or reconciliation fails.
    pub fn reconcile_file(
        &self,
        path: &Path,
        tree: &mut DirectoryTree,
        store: &mut RecordStore,
        chain: &mut StatusChain,
    ) -> Result<Reconciliation, TableError> {
        let keys = self.key_columns(tree.maps())?;
        let table = load_table(path, &keys)?;
        self.reconcile(&table, tree, store, chain)
    }

    /// Partition records and table rows, synthesizing table-only tuples
    ///
    /// # Errors
    /// Returns error if a key has no exact form, a status pass fails, or an
    /// orphan listing cannot be written.
    pub fn reconcile(
        &self,
        table: &Table,
        tree: &mut DirectoryTree,
        store: &mut RecordStore,
        chain: &mut StatusChain,
    ) -> Result<Reconciliation, TableError> {
        chain.ensure::<MatchStatus>()?;
        let maps = tree.maps().to_vec();

        let mut rows: IndexMap<Vec<MatchKey>, &TableRow> = IndexMap::new();
        for row in &table.rows {
            let key = match_keys(&maps, &row.keys)?;
            if rows.contains_key(&key) {
                tracing::warn!(
                    "Duplicate table row at line {} ignored, key already read",
                    row.line
                );
                continue;
            }
            rows.insert(key, row);
        }

        let mut outcome = Reconciliation::default();
        let mut directory_keys = HashSet::new();
        let mut detached: HashMap<Vec<MatchKey>, u64> = HashMap::new();
        let mut updates: Vec<(u64, MatchStatus, Option<&TableRow>)> = Vec::new();

        for record in store.iter() {
            let key = match_keys(&maps, &store.key_of(record))?;
            if record.source != RecordSource::Filesystem {
                detached.insert(key, record.id);
                continue;
            }
            match rows.get(&key) {
                Some(row) => {
                    outcome.matched.push(record.id);
                    updates.push((record.id, MatchStatus::Matched, Some(*row)));
                }
                None => {
                    outcome.directory_only.push(record.id);
                    updates.push((record.id, MatchStatus::DirectoryOnly, None));
                }
            }
            directory_keys.insert(key);
        }

        for (id, status, row) in updates {
            apply(tree, store, id, status, row)?;
        }

        for (key, &row) in &rows {
            if directory_keys.contains(key) {
                continue;
            }
            let id = match detached.get(key) {
                Some(&id) => id,
                None => {
                    let id = place(tree, store, &maps, row)?;
                    outcome.created += 1;
                    id
                }
            };
            apply(tree, store, id, MatchStatus::TableOnly, Some(row))?;
            outcome.table_only.push(id);
        }

        if outcome.matched.is_empty() {
            tracing::error!(
                "No records matched between directory tree and CSV table at '{}'",
                table.path.display()
            );
        }
        tracing::info!(
            "Reconciled {} key tuples: {} matched, {} directory only, {} table only, {} new",
            outcome.total(),
            outcome.matched.len(),
            outcome.directory_only.len(),
            outcome.table_only.len(),
            outcome.created
        );

        store.sort(chain)?;
        self.write_orphans(store, chain, &outcome, rows.len(), directory_keys.len())?;
        tree.update_status(chain, "table_sync")?;
        Ok(outcome)
    }

    fn write_orphans(
        &self,
        store: &RecordStore,
        chain: &StatusChain,
        outcome: &Reconciliation,
        table_rows: usize,
        directories: usize,
    ) -> Result<(), TableError> {
        let Some(dir) = &self.logs_dir else {
            return Ok(());
        };

        let listings = [
            (
                ORPHAN_DIRECTORIES,
                &outcome.directory_only,
                table_rows,
                "directories not matched to table rows",
            ),
            (
                ORPHAN_TABLE_ROWS,
                &outcome.table_only,
                directories,
                "table rows not matched to directories",
            ),
        ];
        for (file, ids, opposite, what) in listings {
            let path = dir.join(file);
            let wanted: HashSet<u64> = ids.iter().copied().collect();
            let count = write_records(&path, store, chain, |r| wanted.contains(&r.id))?;
            tracing::info!(
                "{} [{:4.1}%] {}, CSV file written to '{}'",
                count,
                percent(count, opposite),
                what,
                path.display()
            );
        }
        Ok(())
    }
}

fn apply(
    tree: &mut DirectoryTree,
    store: &mut RecordStore,
    id: u64,
    status: MatchStatus,
    row: Option<&TableRow>,
) -> Result<(), TableError> {
    let record = store.get_mut(id)?;
    if let Some(row) = row {
        for (column, value) in &row.extras {
            record.values.insert(column.clone(), value.clone());
        }
    }
    // Flagged records keep the reason they were flagged for.
    if record.source == RecordSource::Filesystem && !record.valid {
        return Ok(());
    }

    let status: StatusValue = status.into();
    record.set_status(status, None);
    if let Some(node) = record.node {
        let reason = (!status.is_valid()).then(|| status.display().to_lowercase());
        tree.set_status(node, status, reason)?;
    }
    Ok(())
}

fn place(
    tree: &mut DirectoryTree,
    store: &mut RecordStore,
    maps: &[DirectoryMap],
    row: &TableRow,
) -> Result<u64, TableError> {
    let values: IndexMap<String, Value> = maps
        .iter()
        .map(|m| m.name().to_string())
        .zip(row.keys.iter().cloned())
        .collect();

    match tree.synthesize(&row.keys) {
        Ok(synthesis) => {
            let id = store.insert(
                values,
                MatchStatus::TableOnly.into(),
                RecordSource::Synthesized,
                None,
                Some(synthesis.leaf),
            );
            tree.assign_record(synthesis.leaf, id)?;
            Ok(id)
        }
        Err(err) if !matches!(err, TreeError::KeyArity { .. }) => {
            tracing::warn!(
                "Cannot synthesize directory for table row at line {}: {}",
                row.line,
                err
            );
            Ok(store.insert(
                values,
                MatchStatus::TableOnly.into(),
                RecordSource::Table,
                None,
                None,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

fn match_keys(maps: &[DirectoryMap], values: &[Value]) -> Result<Vec<MatchKey>, TableError> {
    maps.iter()
        .zip(values)
        .map(|(map, value)| {
            map.parser()
                .match_key(value)
                .map_err(|source| TableError::Key {
                    column: map.name().to_string(),
                    source,
                })
        })
        .collect()
}
