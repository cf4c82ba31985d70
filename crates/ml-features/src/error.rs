use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("No features selected for analysis")]
    EmptySelection,

    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("Row index has {index} entries but the table has {rows} rows")]
    IndexLength { index: usize, rows: usize },

    #[error("Row index is not strictly increasing at position {0}")]
    NonMonotonicIndex(usize),

    #[error("Raw table has {raw} rows but the ratio table has {ratios}")]
    RowCountMismatch { raw: usize, ratios: usize },

    #[error("Data frame error: {0}")]
    Polars(#[from] PolarsError),
}
