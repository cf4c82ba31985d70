use crate::error::FeatureError;
use crate::table::{RatioTable, RawTable};
use core_types::FeatureOptions;
use ndarray::{Array2, ArrayView1};

/// Which table a matrix column was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    Raw,
    Ratio,
}

/// Provenance of one feature-matrix column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureColumn {
    pub feature: String,
    pub source: ColumnSource,
}

impl FeatureColumn {
    pub fn new(feature: impl Into<String>, source: ColumnSource) -> Self {
        Self {
            feature: feature.into(),
            source,
        }
    }

    /// Display name: the feature name for raw columns, `<feature>_ratio` for ratio columns.
    pub fn label(&self) -> String {
        match self.source {
            ColumnSource::Raw => self.feature.clone(),
            ColumnSource::Ratio => format!("{}_ratio", self.feature),
        }
    }
}

/// The numeric input to the anomaly model: one row per raw row, one column per selected series.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    columns: Vec<FeatureColumn>,
}

impl FeatureMatrix {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(FeatureColumn::label).collect()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(idx)
    }
}

/// Assembles the feature matrix from raw and ratio tables.
pub struct FeatureMatrixBuilder;

impl FeatureMatrixBuilder {
    /// Collects columns in option order: for each feature, the raw column (if
    /// selected and present in `raw`) then the ratio column (if selected and
    /// present in `ratios`).
    ///
    /// # Errors
    ///
    /// `FeatureError::EmptySelection` when no column was collected.
    pub fn build(
        raw: &RawTable,
        ratios: &RatioTable,
        options: &FeatureOptions,
    ) -> Result<FeatureMatrix, FeatureError> {
        if raw.height() != ratios.height() {
            return Err(FeatureError::RowCountMismatch {
                raw: raw.height(),
                ratios: ratios.height(),
            });
        }

        let mut columns = Vec::new();
        let mut data: Vec<Vec<f64>> = Vec::new();

        for (feature_name, selection) in options.iter() {
            if selection.use_raw {
                if let Some(values) = raw.column(feature_name) {
                    columns.push(FeatureColumn::new(feature_name, ColumnSource::Raw));
                    data.push(values);
                }
            }
            if selection.use_ratio {
                if let Some(values) = ratios.column(feature_name) {
                    columns.push(FeatureColumn::new(feature_name, ColumnSource::Ratio));
                    data.push(values);
                }
            }
        }

        if data.is_empty() {
            return Err(FeatureError::EmptySelection);
        }

        // Labels are metadata only; two columns may share one.
        let values = Array2::from_shape_fn((raw.height(), data.len()), |(row, col)| data[col][row]);
        tracing::debug!(
            rows = values.nrows(),
            cols = values.ncols(),
            "Feature matrix assembled"
        );

        Ok(FeatureMatrix { values, columns })
    }
}
