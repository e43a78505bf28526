//! CSV input and output for panels.

use crate::error::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Rows used to infer column types when reading a CSV file.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Read a CSV file with a header row into a [`DataFrame`].
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading csv");

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Write a [`DataFrame`] to a CSV file with a header row.
///
/// Parent directories are created as needed.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    tracing::debug!(path = %path.display(), rows = df.height(), "wrote csv");

    Ok(())
}
