use crate::model::{PersistError, RfqRecord};

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub duplicates: usize,
}

/// Keeps the first record seen for each (RFQ ID, Title) pair, preserving order.
pub fn dedupe(records: Vec<RfqRecord>) -> Vec<RfqRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let (id, title) = r.natural_key();
            seen.insert((id.to_string(), title.to_string()))
        })
        .collect()
}

/// Deduplicates and writes the run's records as CSV.
///
/// The file is assembled next to `path` and renamed into place, so either the
/// whole result lands or the previous state of `path` is left untouched.
pub fn finalize(records: Vec<RfqRecord>, path: &Path) -> Result<ExportSummary, PersistError> {
    let total = records.len();
    let unique = dedupe(records);
    write_atomic(&unique, path)?;

    let summary = ExportSummary {
        path: path.to_path_buf(),
        rows: unique.len(),
        duplicates: total - unique.len(),
    };
    info!(
        "Saved {} rows to {} ({} duplicates dropped)",
        summary.rows,
        summary.path.display(),
        summary.duplicates
    );
    Ok(summary)
}

fn write_atomic(records: &[RfqRecord], path: &Path) -> Result<(), PersistError> {
    let io_error = |source: std::io::Error| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(&dir).map_err(io_error)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(staged.as_file_mut());
        writer.write_record(RfqRecord::COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(io_error)?;
    }

    staged.as_file_mut().flush().map_err(io_error)?;
    staged.as_file().sync_all().map_err(io_error)?;
    staged.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
