use crate::error::FeatureError;
use polars::prelude::*;

/// Time-ordered input rows with named numeric columns.
///
/// Columns are stored as `f64`; missing cells are NaN. The optional domain
/// columns `Open`, `High`, `Low`, `Close` and `Volume` enable ratio
/// derivation but none of them is required.
#[derive(Debug, Clone)]
pub struct RawTable {
    index: Vec<i64>,
    frame: DataFrame,
}

impl RawTable {
    /// Wraps a data frame, indexing its rows positionally (`0..n`).
    ///
    /// Numeric columns of any width are cast to `f64`; a non-numeric column is an error.
    pub fn new(frame: DataFrame) -> Result<Self, FeatureError> {
        let index = (0..frame.height() as i64).collect();
        Self::with_index(index, frame)
    }

    /// Wraps a data frame with an explicit, strictly increasing row key.
    pub fn with_index(index: Vec<i64>, frame: DataFrame) -> Result<Self, FeatureError> {
        if index.len() != frame.height() {
            return Err(FeatureError::IndexLength {
                index: index.len(),
                rows: frame.height(),
            });
        }
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FeatureError::NonMonotonicIndex(pos + 1));
        }

        let mut columns = Vec::with_capacity(frame.width());
        for series in frame.get_columns() {
            if !series.dtype().is_numeric() {
                return Err(FeatureError::NonNumericColumn(series.name().to_string()));
            }
            columns.push(series.cast(&DataType::Float64)?);
        }

        Ok(Self {
            index,
            frame: DataFrame::new(columns)?,
        })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, FeatureError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let series: Vec<Series> = columns
            .into_iter()
            .map(|(name, values)| Series::new(name.as_ref(), values))
            .collect();
        Self::new(DataFrame::new(series)?)
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Returns a copy of the named column, or `None` if it is absent.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        column_values(&self.frame, name)
    }
}

/// Derived indicator columns sharing the row index of the `RawTable` they came from.
///
/// Invariant: every cell is finite.
#[derive(Debug, Clone)]
pub struct RatioTable {
    rows: usize,
    frame: DataFrame,
}

impl RatioTable {
    pub(crate) fn new(rows: usize, columns: Vec<Series>) -> Result<Self, FeatureError> {
        Ok(Self {
            rows,
            frame: DataFrame::new(columns)?,
        })
    }

    /// Row count. Equal to the source table's even when no ratio could be derived.
    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        column_values(&self.frame, name)
    }
}

fn column_values(frame: &DataFrame, name: &str) -> Option<Vec<f64>> {
    let values = frame.column(name).ok()?.f64().ok()?;
    Some(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
