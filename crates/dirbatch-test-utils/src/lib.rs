//! Testing utilities for the dirbatch workspace
//!
//! Synthetic directory hierarchies in temporary directories, the standard
//! `period/depth/cd` layout, and CSV fixtures.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use dirbatch_parser::{Preprocessor, Validator, ValidatorParser, ValueParser};
use tempfile::TempDir;

/// Run directories of the two-run end-to-end scenario
pub const TWO_RUNS: [&str; 2] = [
    "period_100/depth_5/cd_0320_jobA",
    "period_100/depth_5/cd_0320_jobB",
];

/// Temporary root directory populated on demand
#[derive(Debug)]
pub struct DirFixture {
    dir: TempDir,
}

impl DirFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Fixture holding every relative directory in `paths`
    pub fn with_dirs(paths: &[&str]) -> Self {
        let fixture = Self::new();
        for path in paths {
            fixture.mkdir(path);
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn write_file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn write_csv(&self, rel: &str, headers: &[&str], rows: &[&[&str]]) -> PathBuf {
        let path = self.dir.path().join(rel);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        writer.write_record(headers).unwrap();
        for row in rows {
            writer.write_record(*row).unwrap();
        }
        writer.flush().unwrap();
        path
    }
}

impl Default for DirFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `period_<int>`
pub fn period_parser() -> ValidatorParser {
    ValidatorParser::new(Validator::match_first("_"), ValueParser::integer())
}

/// `depth_<int>`
pub fn depth_parser() -> ValidatorParser {
    ValidatorParser::new(Validator::match_first("_"), ValueParser::integer())
}

/// `cd_<4-digit decimal>[_<jobid>]`
pub fn cd_parser() -> ValidatorParser {
    ValidatorParser::new(Validator::match_first("_"), ValueParser::decimal(4))
        .with_preprocessor(Preprocessor::job_id("_"))
}

/// Standard three-level layout as `(name, parser)` pairs
pub fn standard_levels() -> Vec<(&'static str, ValidatorParser)> {
    vec![
        ("period", period_parser()),
        ("depth", depth_parser()),
        ("cd", cd_parser()),
    ]
}
