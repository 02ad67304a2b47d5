//! Flat-file tables
//!
//! Every stage hands its output to the next one as a CSV file with a header
//! row. Rows are (de)serialized with serde, so a record type only has to
//! derive `Serialize`/`Deserialize` and list its columns.

use crate::error::{RepoMetricsError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// A row type that can be stored in a table file
pub trait TableRecord: Serialize + DeserializeOwned {
    /// Column names, in the order the serialized fields appear
    const COLUMNS: &'static [&'static str];
}

/// Write `rows` to `path`, replacing any existing file.
///
/// The header row is always written, so an empty table still carries its
/// column set.
pub fn write_table<T: TableRecord>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "Wrote table");
    Ok(())
}

/// Read every row of the table at `path`.
///
/// Columns are matched by header name. A missing file yields
/// [`RepoMetricsError::FileNotFound`]; any row that does not deserialize
/// aborts the whole read.
pub fn read_table<T: TableRecord>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RepoMetricsError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_reader(std::fs::File::open(path)?);
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;

    debug!(path = %path.display(), rows = rows.len(), "Read table");
    Ok(rows)
}

/// Read only the header row of the table at `path`
pub fn read_columns(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RepoMetricsError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Create the directory that will hold `path`, if it has one.
///
/// Idempotent: an existing directory is left untouched.
pub fn ensure_parent_dir(path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
