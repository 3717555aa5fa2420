//! Delimited output of the record store

use std::path::Path;

use dirbatch_status::StatusChain;

use crate::error::TableError;
use crate::record::{Record, RecordStore};

/// Status column header
pub const STATUS_COLUMN: &str = "status";
/// Record id column header
pub const ID_COLUMN: &str = "record_id";

/// Render a record's status as `"[<id>] <text>"`, plus its message
///
/// # Errors
/// Returns error if the status kind is not registered.
pub fn status_cell(chain: &StatusChain, record: &Record) -> Result<String, TableError> {
    let label = chain.label(record.status)?;
    Ok(match &record.message {
        Some(message) => format!("{label}: {message}"),
        None => label,
    })
}

/// Write the records selected by `filter`, in store order
///
/// Columns: key columns, status, extra columns, record id, source, path.
///
/// # Errors
/// Returns error if the file cannot be written or a status kind is not
/// registered.
pub fn write_records<F>(
    path: &Path,
    store: &RecordStore,
    chain: &StatusChain,
    filter: F,
) -> Result<usize, TableError>
where
    F: Fn(&Record) -> bool,
{
    let mut writer = csv::Writer::from_path(path).map_err(|e| TableError::csv(path, e))?;
    let extras = store.extra_columns();

    let mut header: Vec<&str> = store.keys().iter().map(String::as_str).collect();
    header.push(STATUS_COLUMN);
    header.extend(extras.iter().map(String::as_str));
    header.extend([ID_COLUMN, "source", "path"]);
    writer
        .write_record(&header)
        .map_err(|e| TableError::csv(path, e))?;

    let mut written = 0;
    for record in store.iter().filter(|r| filter(r)) {
        let mut row: Vec<String> = store
            .keys()
            .iter()
            .map(|k| record.get(k).map(ToString::to_string).unwrap_or_default())
            .collect();
        row.push(status_cell(chain, record)?);
        row.extend(
            extras
                .iter()
                .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default()),
        );
        row.push(record.id.to_string());
        row.push(record.source.to_string());
        row.push(
            record
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        writer
            .write_record(&row)
            .map_err(|e| TableError::csv(path, e))?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| TableError::csv(path, csv::Error::from(e)))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordSource;
    use crate::status::MatchStatus;
    use dirbatch_parser::Value;
    use dirbatch_status::TreeStatus;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_labels_and_extras() {
        let mut chain = StatusChain::new();
        chain.ensure::<TreeStatus>().unwrap();
        chain.ensure::<MatchStatus>().unwrap();

        let mut store = RecordStore::new(vec!["period".into()]);
        let mut values = IndexMap::new();
        values.insert("period".to_string(), Value::Int(100));
        values.insert("h".to_string(), Value::Float(1.5));
        let id = store.insert(
            values,
            MatchStatus::Matched.into(),
            RecordSource::Filesystem,
            Some("/r/period_100".into()),
            None,
        );
        let mut values = IndexMap::new();
        values.insert("period".to_string(), Value::Int(200));
        let other = store.insert(values, TreeStatus::Valid.into(), RecordSource::Table, None, None);
        store
            .get_mut(other)
            .unwrap()
            .set_status(MatchStatus::TableOnly.into(), Some("no directory".into()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(write_records(&path, &store, &chain, |_| true).unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            format!(
                "period,status,h,record_id,source,path\n\
                 100,[3] Matched directory and table row,1.5,{id},filesystem,/r/period_100\n\
                 200,[5] Not matched to directory: no directory,,{other},table,\n"
            )
        );
    }
}
