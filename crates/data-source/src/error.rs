use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Failed to open input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read input table: {0}")]
    Read(#[from] polars::prelude::PolarsError),

    #[error("Unsupported input format '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("Input file has no numeric columns")]
    NoNumericColumns,

    #[error("Input table is invalid: {0}")]
    InvalidTable(#[from] ml_features::FeatureError),
}
