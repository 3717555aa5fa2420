//! Batch configuration
//!
//! [`BatchConfig`] is the explicit description of one batch: where the
//! root is, which directory maps decode each level, and which table (if
//! any) supplies the ground truth.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dirbatch_parser::{check_parser, NameParser, ParserCheck};
use dirbatch_table::TableMap;
use dirbatch_tree::DirectoryMap;

use crate::error::BatchError;

/// Default name of the output directory under the root
pub const DEFAULT_OUTPUT: &str = "batch_postprocessing";
/// Name of the unified output table
pub const AGGREGATE_FILE: &str = "aggregate_data.csv";

/// Configuration of one batch
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Run name, used for the log file
    pub name: String,
    /// Root of the directory hierarchy
    pub root: PathBuf,
    /// Output directory name under the root, excluded from the crawl
    pub output: String,
    /// External table
    pub table: Option<PathBuf>,
    /// One map per nesting level
    pub directory_maps: Vec<DirectoryMap>,
    /// Column bindings for the table
    pub table_maps: Vec<TableMap>,
    /// Whether stage snapshots are written
    pub snapshots: bool,
}

impl BatchConfig {
    /// Create configuration for `root`
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            output: DEFAULT_OUTPUT.to_string(),
            table: None,
            directory_maps: Vec::new(),
            table_maps: Vec::new(),
            snapshots: true,
        }
    }

    /// With directory map
    #[must_use]
    pub fn with_directory_map(
        mut self,
        name: impl Into<String>,
        parser: impl NameParser + 'static,
    ) -> Self {
        self.directory_maps.push(DirectoryMap::new(name, parser));
        self
    }

    /// With prebuilt directory map
    #[must_use]
    pub fn with_map(mut self, map: DirectoryMap) -> Self {
        self.directory_maps.push(map);
        self
    }

    /// With external table
    #[inline]
    #[must_use]
    pub fn with_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.table = Some(path.into());
        self
    }

    /// With column binding
    #[must_use]
    pub fn with_table_map(mut self, name: impl Into<String>, column: impl Into<String>) -> Self {
        self.table_maps.push(TableMap::new(name, column));
        self
    }

    /// With output directory name
    #[inline]
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// With snapshots switched on or off
    #[inline]
    #[must_use]
    pub fn with_snapshots(mut self, enabled: bool) -> Self {
        self.snapshots = enabled;
        self
    }

    /// `<root>/<output>`
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output)
    }

    /// `<root>/<output>/logs`
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir().join("logs")
    }

    /// `<root>/<output>/aggregate_data.csv`
    #[must_use]
    pub fn aggregate_path(&self) -> PathBuf {
        self.output_dir().join(AGGREGATE_FILE)
    }

    /// `<root>/<output>/logs/<name>.log`
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(format!("{}.log", self.name))
    }

    /// Check the configuration before any filesystem work
    ///
    /// # Errors
    /// Returns [`BatchError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.name.trim().is_empty() {
            return Err(BatchError::config("run name is empty"));
        }
        if self.output.is_empty() || Path::new(&self.output).components().count() != 1 {
            return Err(BatchError::config(format!(
                "output directory '{}' must be a single path component",
                self.output
            )));
        }
        if self.directory_maps.is_empty() {
            return Err(BatchError::config("no directory maps declared"));
        }

        let mut names = HashSet::new();
        for map in &self.directory_maps {
            if !names.insert(map.name()) {
                return Err(BatchError::config(format!(
                    "directory map '{}' declared twice",
                    map.name()
                )));
            }
        }

        let mut bound = HashSet::new();
        for table_map in &self.table_maps {
            if !names.contains(table_map.name()) {
                return Err(BatchError::config(format!(
                    "table map '{}' does not name a directory map",
                    table_map.name()
                )));
            }
            if !bound.insert(table_map.name()) {
                return Err(BatchError::config(format!(
                    "table map '{}' declared twice",
                    table_map.name()
                )));
            }
        }
        if !self.table_maps.is_empty() && self.table.is_none() {
            return Err(BatchError::config("table maps declared without a table"));
        }
        Ok(())
    }

    /// Run parser diagnostics for one directory map over sample names
    ///
    /// # Errors
    /// Returns error if no map is named `level` or a parser fails.
    pub fn check(&self, level: &str, samples: &[String]) -> Result<Vec<ParserCheck>, BatchError> {
        let position = self
            .directory_maps
            .iter()
            .position(|m| m.name() == level)
            .ok_or_else(|| BatchError::config(format!("no directory map named '{level}'")))?;
        let map = &self.directory_maps[position];
        let is_last = position + 1 == self.directory_maps.len();

        samples
            .iter()
            .map(|sample| Ok(check_parser(map.parser(), map.token(), sample, is_last)?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbatch_test_utils::{cd_parser, depth_parser, period_parser};

    fn config() -> BatchConfig {
        BatchConfig::new("demo", "/data/runs")
            .with_directory_map("period", period_parser())
            .with_directory_map("depth", depth_parser())
            .with_directory_map("cd", cd_parser())
    }

    #[test]
    fn derives_output_paths() {
        let c = config();
        assert_eq!(
            c.aggregate_path(),
            Path::new("/data/runs/batch_postprocessing/aggregate_data.csv")
        );
        assert_eq!(c.log_file(), Path::new("/data/runs/batch_postprocessing/logs/demo.log"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_configurations() {
        assert!(BatchConfig::new("demo", "/r").validate().is_err());
        assert!(config().with_directory_map("cd", cd_parser()).validate().is_err());
        assert!(config().with_table_map("period", "T").validate().is_err());
        assert!(config()
            .with_table("t.csv")
            .with_table_map("pressure", "p")
            .validate()
            .is_err());
        assert!(config().with_output("a/b").validate().is_err());
        assert!(config().with_table("t.csv").with_table_map("period", "T").validate().is_ok());
    }

    #[test]
    fn checks_samples_per_level() {
        let checks = config()
            .check("cd", &["cd_0320_jobA".into(), "cd_320".into(), "xx".into()])
            .unwrap();
        assert!(checks[0].is_success());
        assert_eq!(checks[2], ParserCheck::Ignored);

        let checks = config().check("period", &["period_7_jobA".into()]).unwrap();
        assert!(!checks[0].is_success());
        assert!(config().check("nope", &[]).is_err());
    }
}
