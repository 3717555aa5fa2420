//! External table loading
//!
//! Reads a delimited file with one column per matching key plus arbitrary
//! extra columns. Key cells are decoded with the directory map's value
//! type; extra cells are inferred as integer, float or text.

use std::path::{Path, PathBuf};

use dirbatch_parser::{Value, ValueType};
use indexmap::IndexMap;

use crate::error::TableError;

/// Binding of a directory map name to a table column header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMap {
    name: String,
    column: String,
}

impl TableMap {
    /// Bind map `name` to `column`
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }

    /// Column header equal to the map name
    pub fn same(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
        }
    }

    /// Directory map name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column header
    #[inline]
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }
}

/// Resolved matching key column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    /// Directory map name
    pub name: String,
    /// Table header
    pub column: String,
    /// Declared value type of the map
    pub value_type: ValueType,
}

/// One accepted table row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Line number in the source file
    pub line: u64,
    /// Key values in directory map order
    pub keys: Vec<Value>,
    /// Non-key cells by header
    pub extras: IndexMap<String, Value>,
}

/// Loaded external table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Source file
    pub path: PathBuf,
    /// Kept headers in file order
    pub columns: Vec<String>,
    /// Accepted rows in file order
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Number of accepted rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row was accepted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a table, decoding `keys` from their columns
///
/// Columns with a blank header are dropped with a warning. Rows whose key
/// cells cannot be decoded are skipped with a warning.
///
/// # Errors
/// Returns error if the file cannot be read or a key column is missing.
pub fn load_table(path: &Path, keys: &[KeyColumn]) -> Result<Table, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| TableError::csv(path, e))?
        .clone();

    let mut kept: Vec<(usize, String)> = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() {
            tracing::warn!(
                "Dropping column {} with no header from CSV table at '{}'",
                index + 1,
                path.display()
            );
        } else {
            kept.push((index, header.to_string()));
        }
    }

    let mut key_index = Vec::with_capacity(keys.len());
    for key in keys {
        let index = kept
            .iter()
            .find(|(_, h)| *h == key.column)
            .map(|(i, _)| *i)
            .ok_or_else(|| {
                tracing::error!(
                    "Column '{}' does not exist in CSV table at '{}'",
                    key.column,
                    path.display()
                );
                TableError::MissingColumn {
                    column: key.column.clone(),
                    path: path.to_path_buf(),
                }
            })?;
        key_index.push(index);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| TableError::csv(path, e))?;
        let line = record.position().map_or(0, csv::Position::line);

        let mut values = Vec::with_capacity(keys.len());
        for (key, &index) in keys.iter().zip(&key_index) {
            let cell = record.get(index).unwrap_or("");
            match Value::parse_as(cell, key.value_type).filter(|_| !cell.is_empty()) {
                Some(value) => values.push(value),
                None => {
                    tracing::warn!(
                        "Skipping table row at line {}: cannot read '{}' in column '{}' as {}",
                        line,
                        cell,
                        key.column,
                        key.value_type
                    );
                    break;
                }
            }
        }
        if values.len() != keys.len() {
            continue;
        }

        let mut extras = IndexMap::new();
        for (index, header) in &kept {
            if key_index.contains(index) {
                continue;
            }
            match record.get(*index) {
                Some(cell) if !cell.is_empty() => {
                    extras.insert(header.clone(), infer(cell));
                }
                _ => {}
            }
        }

        rows.push(TableRow {
            line,
            keys: values,
            extras,
        });
    }

    tracing::info!(
        "Loaded {} rows from CSV table at '{}'",
        rows.len(),
        path.display()
    );
    Ok(Table {
        path: path.to_path_buf(),
        columns: kept.into_iter().map(|(_, h)| h).collect(),
        rows,
    })
}

fn infer(cell: &str) -> Value {
    Value::parse_as(cell, ValueType::Int)
        .or_else(|| Value::parse_as(cell, ValueType::Float))
        .unwrap_or_else(|| Value::Text(cell.to_string()))
}
