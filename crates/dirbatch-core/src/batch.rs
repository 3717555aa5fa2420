//! Batch pipeline
//!
//! [`Batch::open`] runs the full pipeline once: crawl, depth check,
//! virtual-leaf flattening, record store, optional table reconciliation,
//! unified output. Afterwards the batch hands valid records to external
//! workers through [`Batch::pending`] and takes their results back through
//! [`Batch::apply_updates`].

use std::fs;
use std::path::Path;

use dirbatch_parser::Value;
use dirbatch_status::{StatusChain, StatusValue};
use dirbatch_table::{
    write_records, Reconciler, Reconciliation, Record, RecordStore, TableError,
};
use dirbatch_tree::{DirectoryTree, TreeOptions};
use indexmap::IndexMap;

use crate::banner::banner;
use crate::config::BatchConfig;
use crate::error::BatchError;

/// Result of external work on one record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    /// Record id
    pub id: u64,
    /// New status, of any kind
    pub status: StatusValue,
    /// Note rendered after the status label
    pub message: Option<String>,
    /// Extra columns to set
    pub values: Vec<(String, Value)>,
    /// Whether the record may go on to the next stage
    pub proceed: bool,
}

impl RecordUpdate {
    /// Create update that lets the record proceed when `status` is valid
    pub fn new(id: u64, status: impl Into<StatusValue>) -> Self {
        let status = status.into();
        Self {
            id,
            status,
            message: None,
            values: Vec::new(),
            proceed: status.is_valid(),
        }
    }

    /// With message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// With extra column
    #[must_use]
    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// With proceed flag
    #[must_use]
    pub fn with_proceed(mut self, proceed: bool) -> Self {
        self.proceed = proceed;
        self
    }
}

/// Record handed to an external worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pending<'a> {
    /// Record id
    pub id: u64,
    /// Record directory, `None` for table-only records
    pub path: Option<&'a Path>,
    /// Key and extra columns
    pub values: &'a IndexMap<String, Value>,
}

/// Counts reported after the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Records in the store
    pub records: usize,
    /// Records still valid
    pub valid: usize,
    /// Tree nodes, synthesized ones included
    pub nodes: usize,
    /// Status passes run so far
    pub stages: u32,
}

/// One batch: tree, record store and status registry
#[derive(Debug)]
pub struct Batch {
    config: BatchConfig,
    tree: DirectoryTree,
    store: RecordStore,
    chain: StatusChain,
    reconciliation: Option<Reconciliation>,
}

impl Batch {
    /// Run the pipeline for `config`
    ///
    /// # Errors
    /// Returns error on an invalid configuration, a structural violation
    /// in the tree or table, or an output failure.
    pub fn open(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate()?;
        let logs = config.logs_dir();
        fs::create_dir_all(&logs).map_err(|e| BatchError::io(&logs, e))?;

        banner("Directory mapping");
        let mut options = TreeOptions::new().with_reserved(config.output.as_str());
        if config.snapshots {
            options = options.with_snapshot_dir(&logs);
        }
        let mut chain = StatusChain::new();
        let mut tree =
            DirectoryTree::build(&config.root, config.directory_maps.clone(), options, &mut chain)?;
        let depth = tree.check_depth(&chain)?;
        tracing::info!(
            "Tree depth {} of {} declared directory maps",
            depth.found,
            depth.declared
        );
        tree.flatten_virtual_leaves(&chain)?;
        let mut store = RecordStore::from_tree(&mut tree)?;

        let reconciliation = match &config.table {
            Some(table) => {
                banner("Table sync");
                let reconciler =
                    Reconciler::new(config.table_maps.clone()).with_logs_dir(&logs);
                Some(reconciler.reconcile_file(table, &mut tree, &mut store, &mut chain)?)
            }
            None => {
                store.sort(&chain)?;
                None
            }
        };

        let batch = Self {
            config,
            tree,
            store,
            chain,
            reconciliation,
        };
        batch.write_output()?;
        Ok(batch)
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Directory tree
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Record store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Status registry
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &StatusChain {
        &self.chain
    }

    /// Outcome of the table sync, if a table was configured
    #[inline]
    #[must_use]
    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        self.reconciliation.as_ref()
    }

    /// Current counts
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            records: self.store.len(),
            valid: self.store.valid().count(),
            nodes: self.tree.len(),
            stages: self.tree.stage(),
        }
    }

    /// Valid records, in store order
    #[must_use]
    pub fn pending(&self) -> Vec<Pending<'_>> {
        self.store
            .valid()
            .map(|record: &Record| Pending {
                id: record.id,
                path: record.path.as_deref(),
                values: &record.values,
            })
            .collect()
    }

    /// Merge results of external work and return the ids that may proceed
    ///
    /// Every id is checked before any record changes. Unseen status kinds
    /// are registered on first sight. The store is
    /// re-sorted, the unified output rewritten and a status pass labelled
    /// `name` is run.
    ///
    /// # Errors
    /// Returns error if an update names an unknown record or a status kind
    /// cannot be registered.
    pub fn apply_updates(
        &mut self,
        name: &str,
        updates: Vec<RecordUpdate>,
    ) -> Result<Vec<u64>, BatchError> {
        banner(name);
        let total = updates.len();
        let mut counts: IndexMap<StatusValue, usize> = IndexMap::new();
        let mut proceeding = Vec::new();

        if let Some(unknown) = updates.iter().find(|u| self.store.get(u.id).is_none()) {
            return Err(TableError::UnknownRecord(unknown.id).into());
        }
        for update in &updates {
            self.chain.observe(update.status)?;
        }

        for update in updates {
            let record = self.store.get_mut(update.id)?;
            for (column, value) in update.values {
                record.values.insert(column, value);
            }
            record.set_status(update.status, update.message.clone());
            if let Some(node) = record.node {
                let reason = (!update.status.is_valid())
                    .then(|| update.message.unwrap_or_else(|| update.status.display().to_string()));
                self.tree.set_status(node, update.status, reason)?;
            }
            *counts.entry(update.status).or_default() += 1;
            if update.proceed && update.status.is_valid() {
                proceeding.push(update.id);
            }
        }

        for (status, count) in &counts {
            if status.is_valid() {
                continue;
            }
            tracing::warn!(
                "{} [{:4.1}%] {} in stage '{}'",
                count,
                percent(*count, total),
                self.chain.label(*status)?,
                name
            );
        }
        tracing::info!(
            "{} of {} records proceed after stage '{}'",
            proceeding.len(),
            total,
            name
        );

        self.store.sort(&self.chain)?;
        self.write_output()?;
        self.tree.update_status(&self.chain, name)?;
        Ok(proceeding)
    }

    /// Rewrite `aggregate_data.csv`
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write_output(&self) -> Result<usize, BatchError> {
        let path = self.config.aggregate_path();
        let written = write_records(&path, &self.store, &self.chain, |_| true)?;
        tracing::info!("{} records written to '{}'", written, path.display());
        Ok(written)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}
