//! Declarative layout files
//!
//! A TOML layout declares the directory maps of a batch without code:
//!
//! ```toml
//! name = "funwave"
//! root = "runs"
//! table = "runs.csv"
//!
//! [[directory]]
//! name = "period"
//! parser = { validator = "match_first", value = "integer" }
//!
//! [[directory]]
//! name = "cd"
//! parser = { validator = "match_first", value = "decimal", digits = 4, suffix = "jobid" }
//!
//! [[column]]
//! name = "period"
//! column = "T"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use dirbatch_parser::{Preprocessor, SplitAt, Validator, ValidatorParser, ValueParser};
use dirbatch_tree::DirectoryMap;
use serde::Deserialize;

use crate::config::BatchConfig;
use crate::error::BatchError;

/// Literal naming convention of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    /// `<token><value>`
    #[default]
    StartsWith,
    /// `<token><delim><value>`
    MatchFirst,
    /// `<value><delim><token>`
    MatchLast,
}

/// Value encoding of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Signed integer
    #[default]
    Integer,
    /// Fixed-digit decimal
    Decimal,
    /// Free text
    Text,
}

fn default_delimiter() -> String {
    "_".to_string()
}

fn default_true() -> bool {
    true
}

/// Parser declaration of one level
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserSpec {
    /// Naming convention
    #[serde(default)]
    pub validator: ValidatorKind,
    /// Component delimiter for `match_*` validators and the suffix
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Literal the validator looks for, defaults to the map name
    #[serde(default)]
    pub token: Option<String>,
    /// Value encoding
    #[serde(default)]
    pub value: ValueKind,
    /// Zero-padded width of integers
    #[serde(default)]
    pub width: Option<usize>,
    /// Digit count of decimals
    #[serde(default)]
    pub digits: Option<usize>,
    /// Decimal exponent offset
    #[serde(default)]
    pub offset: i32,
    /// Negate values when decoding
    #[serde(default)]
    pub flip_sign: bool,
    /// Name of the text suffix split off the last component
    #[serde(default)]
    pub suffix: Option<String>,
}

impl Default for ParserSpec {
    fn default() -> Self {
        Self {
            validator: ValidatorKind::default(),
            delimiter: default_delimiter(),
            token: None,
            value: ValueKind::default(),
            width: None,
            digits: None,
            offset: 0,
            flip_sign: false,
            suffix: None,
        }
    }
}

impl ParserSpec {
    /// Build the parser this declaration describes
    ///
    /// # Errors
    /// Returns [`BatchError::Config`] for an inconsistent declaration.
    pub fn build(&self, map: &str) -> Result<ValidatorParser, BatchError> {
        let mut value = match self.value {
            ValueKind::Integer => {
                if self.digits.is_some() || self.offset != 0 {
                    return Err(BatchError::config(format!(
                        "map '{map}': digits and offset apply to decimals only"
                    )));
                }
                ValueParser::integer().with_width(self.width.unwrap_or(0))
            }
            ValueKind::Decimal => {
                let digits = self.digits.filter(|d| *d > 0).ok_or_else(|| {
                    BatchError::config(format!("map '{map}': decimal needs digits > 0"))
                })?;
                ValueParser::decimal(digits).with_offset(self.offset)
            }
            ValueKind::Text => {
                if self.flip_sign || self.width.is_some() || self.digits.is_some() {
                    return Err(BatchError::config(format!(
                        "map '{map}': text values take no numeric options"
                    )));
                }
                ValueParser::text()
            }
        };
        if self.flip_sign {
            value = value.flipped();
        }

        let validator = match self.validator {
            ValidatorKind::StartsWith => Validator::starts_with(),
            ValidatorKind::MatchFirst => Validator::match_first(self.delimiter.as_str()),
            ValidatorKind::MatchLast => Validator::match_last(self.delimiter.as_str()),
        };
        let mut parser = ValidatorParser::new(validator, value);
        if let Some(name) = &self.suffix {
            parser = parser.with_preprocessor(Preprocessor::new(
                SplitAt::last(self.delimiter.as_str()),
                ValueParser::text(),
                name.as_str(),
            ));
        }
        Ok(parser)
    }
}

/// One `[[directory]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectorySpec {
    /// Map name
    pub name: String,
    /// Parser declaration
    #[serde(default)]
    pub parser: ParserSpec,
}

/// One `[[column]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    /// Directory map name
    pub name: String,
    /// Table header
    pub column: String,
}

/// Parsed layout file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutFile {
    /// Run name
    pub name: String,
    /// Root directory
    pub root: PathBuf,
    /// External table
    #[serde(default)]
    pub table: Option<PathBuf>,
    /// Output directory name
    #[serde(default)]
    pub output: Option<String>,
    /// Whether stage snapshots are written
    #[serde(default = "default_true")]
    pub snapshots: bool,
    /// Levels, outermost first
    #[serde(default, rename = "directory")]
    pub directories: Vec<DirectorySpec>,
    /// Column bindings
    #[serde(default, rename = "column")]
    pub columns: Vec<ColumnSpec>,
}

impl LayoutFile {
    /// Read and parse a layout file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid layout.
    pub fn from_path(path: &Path) -> Result<Self, BatchError> {
        let text = fs::read_to_string(path).map_err(|e| BatchError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse layout text; `origin` is only used in error messages
    ///
    /// # Errors
    /// Returns [`BatchError::Layout`] if the text is not a valid layout.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, BatchError> {
        toml::from_str(text).map_err(|source| BatchError::Layout {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Build the batch configuration, resolving relative paths against `base`
    ///
    /// # Errors
    /// Returns error if a parser declaration is inconsistent.
    pub fn into_config(self, base: &Path) -> Result<BatchConfig, BatchError> {
        let mut config = BatchConfig::new(self.name, base.join(&self.root))
            .with_snapshots(self.snapshots);
        if let Some(output) = self.output {
            config = config.with_output(output);
        }
        if let Some(table) = &self.table {
            config = config.with_table(base.join(table));
        }
        for directory in &self.directories {
            let parser = directory.parser.build(&directory.name)?;
            let mut map = DirectoryMap::new(directory.name.as_str(), parser);
            if let Some(token) = &directory.parser.token {
                map = map.with_token(token.as_str());
            }
            config = config.with_map(map);
        }
        for column in self.columns {
            config = config.with_table_map(column.name, column.column);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbatch_parser::{NameParser, Value};

    const LAYOUT: &str = r#"
name = "funwave"
root = "runs"
table = "runs.csv"

[[directory]]
name = "period"
parser = { validator = "match_first", value = "integer" }

[[directory]]
name = "depth"
parser = { validator = "match_first", value = "integer", width = 3 }

[[directory]]
name = "cd"
parser = { validator = "match_first", value = "decimal", digits = 4, suffix = "jobid" }

[[column]]
name = "period"
column = "T"
"#;

    #[test]
    fn parses_and_builds_config() {
        let layout = LayoutFile::parse(LAYOUT, Path::new("layout.toml")).unwrap();
        assert_eq!(layout.directories.len(), 3);
        assert!(layout.snapshots);

        let config = layout.into_config(Path::new("/data")).unwrap();
        assert_eq!(config.root, Path::new("/data/runs"));
        assert_eq!(config.table.as_deref(), Some(Path::new("/data/runs.csv")));
        assert_eq!(config.table_maps[0].column(), "T");
        config.validate().unwrap();

        let depth = config.directory_maps[1].parser();
        let attrs = depth.forward("depth", "depth_005").unwrap().unwrap();
        assert_eq!(attrs.get("depth"), Some(&Value::Int(5)));

        let cd = config.directory_maps[2].parser();
        let attrs = cd.forward("cd", "cd_0320_run7").unwrap().unwrap();
        assert_eq!(attrs.suffix().map(|s| s.value.clone()), Some(Value::from("run7")));
    }

    #[test]
    fn decimal_requires_digits() {
        let spec = ParserSpec {
            value: ValueKind::Decimal,
            ..ParserSpec::default()
        };
        assert!(spec.build("cd").unwrap_err().is_config_error());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = LayoutFile::parse("name = \"x\"\nroot = \".\"\ncolour = 1\n", Path::new("l.toml"))
            .unwrap_err();
        assert!(matches!(err, BatchError::Layout { .. }));
    }
}
