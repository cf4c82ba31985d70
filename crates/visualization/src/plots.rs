use crate::error::VisualizationError;
use serde::Serialize;

/// One series over the row index with its anomalous points marked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPlot {
    pub feature_name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub index: Vec<i64>,
    pub values: Vec<f64>,
    pub anomalies: Vec<bool>,
}

impl TimeSeriesPlot {
    pub fn new(
        feature_name: impl Into<String>,
        index: Vec<i64>,
        values: Vec<f64>,
        anomalies: Vec<bool>,
    ) -> Result<Self, VisualizationError> {
        let feature_name = feature_name.into();
        if index.len() != values.len() || values.len() != anomalies.len() {
            return Err(VisualizationError::InvalidData(format!(
                "time series '{feature_name}' has {} index entries, {} values and {} flags",
                index.len(),
                values.len(),
                anomalies.len()
            )));
        }

        Ok(Self {
            title: format!("Anomalies in {feature_name}"),
            x_label: "Time".to_string(),
            y_label: "Value".to_string(),
            feature_name,
            index,
            values,
            anomalies,
        })
    }

    /// `(index, value)` of every flagged point, in row order.
    pub fn anomaly_points(&self) -> Vec<(i64, f64)> {
        self.index
            .iter()
            .zip(&self.values)
            .zip(&self.anomalies)
            .filter(|(_, flagged)| **flagged)
            .map(|((&i, &v), _)| (i, v))
            .collect()
    }
}

/// A fixed-width histogram bucket, `[lower, upper)` except the last which is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Distribution of anomaly scores with the decision threshold marked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
    pub title: String,
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub bins: Vec<HistogramBin>,
}

impl ScoreDistribution {
    pub fn new(scores: Vec<f64>, threshold: f64, n_bins: usize) -> Self {
        let bins = histogram(&scores, n_bins);
        Self {
            title: "Distribution of Anomaly Scores".to_string(),
            scores,
            threshold,
            bins,
        }
    }
}

fn histogram(values: &[f64], n_bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || n_bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == n_bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Pairwise Pearson correlation between labelled columns.
///
/// A cell is `None` when either column has zero variance or contains a
/// non-finite value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn from_columns(columns: &[(String, Vec<f64>)]) -> Result<Self, VisualizationError> {
        if let Some(len) = columns.first().map(|(_, v)| v.len()) {
            if let Some((name, _)) = columns.iter().find(|(_, v)| v.len() != len) {
                return Err(VisualizationError::InvalidData(format!(
                    "column '{name}' length differs from the first column ({len} rows)"
                )));
            }
        }

        let values = columns
            .iter()
            .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
            .collect();

        Ok(Self {
            title: "Feature Correlation Matrix".to_string(),
            labels: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() < 2 || a.iter().chain(b).any(|v| !v.is_finite()) {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_points() {
        let plot = TimeSeriesPlot::new("Close", vec![0, 1, 2], vec![1.0, 9.0, 1.5], vec![false, true, false])
            .unwrap();
        assert_eq!(plot.anomaly_points(), vec![(1, 9.0)]);
        assert_eq!(plot.title, "Anomalies in Close");
    }

    #[test]
    fn test_mismatched_series_is_rejected() {
        assert!(TimeSeriesPlot::new("x", vec![0, 1], vec![1.0], vec![false, true]).is_err());
    }

    #[test]
    fn test_histogram_counts_every_score() {
        let scores: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let dist = ScoreDistribution::new(scores, 0.9, 10);
        assert_eq!(dist.bins.len(), 10);
        assert_eq!(dist.bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert!(dist.bins.iter().all(|b| b.count == 10));
    }

    #[test]
    fn test_histogram_of_constant_scores_is_one_bin() {
        let dist = ScoreDistribution::new(vec![0.5; 7], 0.5, 50);
        assert_eq!(dist.bins, vec![HistogramBin { lower: 0.5, upper: 0.5, count: 7 }]);
    }

    #[test]
    fn test_correlation() {
        let up = vec![1.0, 2.0, 3.0, 4.0];
        let down = vec![8.0, 6.0, 4.0, 2.0];
        let flat = vec![3.0; 4];
        let matrix = CorrelationMatrix::from_columns(&[
            ("up".to_string(), up),
            ("down".to_string(), down),
            ("flat".to_string(), flat),
        ])
        .unwrap();

        assert!((matrix.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get(0, 1).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(matrix.get(0, 2), None);
        assert_eq!(matrix.get(2, 2), None);
    }
}
