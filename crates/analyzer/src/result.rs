use ml_features::FeatureMatrix;
use std::cmp::Ordering;

/// The outcome of one scoring pass. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// One score per row; higher is more anomalous.
    pub anomaly_scores: Vec<f64>,
    pub threshold: f64,
    /// `anomaly_scores[i] >= threshold`.
    pub anomaly_flags: Vec<bool>,
    pub contamination: f64,
    pub feature_matrix: FeatureMatrix,
    /// Row keys of the input table, aligned with the scores.
    pub row_index: Vec<i64>,
}

/// A flagged row, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedAnomaly {
    pub row: usize,
    pub key: i64,
    pub score: f64,
}

impl AnalysisResult {
    pub fn len(&self) -> usize {
        self.anomaly_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomaly_scores.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomaly_flags.iter().filter(|&&flagged| flagged).count()
    }

    /// Row positions of flagged rows, ascending.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomaly_flags
            .iter()
            .enumerate()
            .filter_map(|(row, &flagged)| flagged.then_some(row))
            .collect()
    }

    pub fn anomaly_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.anomaly_count() as f64 / self.len() as f64
    }

    /// Flagged rows, most anomalous first.
    pub fn ranked_anomalies(&self) -> Vec<RankedAnomaly> {
        let mut ranked: Vec<RankedAnomaly> = self
            .anomaly_indices()
            .into_iter()
            .map(|row| RankedAnomaly {
                row,
                key: self.row_index.get(row).copied().unwrap_or(row as i64),
                score: self.anomaly_scores[row],
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }
}
