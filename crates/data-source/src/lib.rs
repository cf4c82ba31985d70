//! Loads input tables from disk.
//!
//! Only numeric columns are kept: the pipeline derives features from numbers,
//! so text columns such as a date label are dropped on load. Rows keep their
//! file order and are indexed positionally.

use crate::error::DataSourceError;
use ml_features::RawTable;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub mod error;

/// Reads a `.csv` (with header row) or `.parquet` file into a `RawTable`.
pub fn load_table(path: &Path) -> Result<RawTable, DataSourceError> {
    let frame = read_frame(path)?;
    let numeric = select_numeric(frame)?;
    let table = RawTable::new(numeric)?;

    tracing::info!(
        path = %path.display(),
        rows = table.height(),
        columns = ?table.column_names(),
        "Loaded input table"
    );
    Ok(table)
}

/// Lists the numeric column names of a file, in file order.
pub fn numeric_columns(path: &Path) -> Result<Vec<String>, DataSourceError> {
    let frame = read_frame(path)?;
    Ok(select_numeric(frame)?
        .get_column_names()
        .into_iter()
        .map(str::to_string)
        .collect())
}

fn read_frame(path: &Path) -> Result<DataFrame, DataSourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(CsvReader::from_path(path)?.has_header(true).finish()?),
        "parquet" => Ok(ParquetReader::new(File::open(path)?).finish()?),
        other => Err(DataSourceError::UnsupportedFormat(other.to_string())),
    }
}

fn select_numeric(frame: DataFrame) -> Result<DataFrame, DataSourceError> {
    let mut kept = Vec::with_capacity(frame.width());
    for series in frame.get_columns() {
        if series.dtype().is_numeric() {
            kept.push(series.clone());
        } else {
            tracing::debug!(column = series.name(), dtype = ?series.dtype(), "Dropping non-numeric column");
        }
    }

    if kept.is_empty() {
        return Err(DataSourceError::NoNumericColumns);
    }
    Ok(DataFrame::new(kept)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_keeps_numeric_columns_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "prices.csv",
            "Date,Open,Close,Volume\n2024-01-01,1.0,1.5,100\n2024-01-02,1.5,2.0,120\n2024-01-03,2.0,1.8,90\n",
        );

        let table = load_table(&path).unwrap();
        assert_eq!(table.column_names(), vec!["Open", "Close", "Volume"]);
        assert_eq!(table.height(), 3);
        assert_eq!(table.column("Volume"), Some(vec![100.0, 120.0, 90.0]));
    }

    #[test]
    fn test_empty_cells_become_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "gaps.csv", "Close,Open\n1.0,1.0\n,2.0\n3.0,3.0\n");

        let table = load_table(&path).unwrap();
        let close = table.column("Close").unwrap();
        assert_eq!(close[0], 1.0);
        assert!(close[1].is_nan());
    }

    #[test]
    fn test_text_only_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "labels.csv", "Name\nalpha\nbeta\n");
        assert!(matches!(load_table(&path), Err(DataSourceError::NoNumericColumns)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "prices.xlsx", "");
        assert!(matches!(
            load_table(&path),
            Err(DataSourceError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_numeric_columns_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "mixed.csv", "Ticker,High,Low\nABC,2.0,1.0\n");
        assert_eq!(numeric_columns(&path).unwrap(), vec!["High", "Low"]);
    }
}
