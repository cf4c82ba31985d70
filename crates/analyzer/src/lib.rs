use crate::error::AnalyzerError;
use crate::isolation_forest::{ForestParams, IsolationForest, contamination_threshold};
use configuration::{AnalysisSettings, FeatureSettings, PlotStyle};
use core_types::FeatureOptions;
use ml_features::{FeatureMatrix, FeatureMatrixBuilder, RatioEngine, RatioWindows, RawTable};
use visualization::{CorrelationMatrix, ScoreDistribution, TimeSeriesPlot, Visualizer};

pub mod error;
pub mod isolation_forest;
pub mod result;

pub use result::{AnalysisResult, RankedAnomaly};

/// Where an analyzer is in its single pass. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerState {
    Idle,
    FeaturesPrepared,
    Scored,
    PlotsGenerated,
}

struct Prepared {
    row_index: Vec<i64>,
    matrix: FeatureMatrix,
}

/// Runs one analysis: derive features, score rows, hand plots to a visualizer.
///
/// An instance serves exactly one run; create a fresh one for the next.
pub struct AnomalyAnalyzer {
    settings: AnalysisSettings,
    ratio_engine: RatioEngine,
    plot_style: PlotStyle,
    visualizer: Box<dyn Visualizer>,
    state: AnalyzerState,
    prepared: Option<Prepared>,
}

impl AnomalyAnalyzer {
    pub fn new(
        settings: AnalysisSettings,
        visualizer: Box<dyn Visualizer>,
    ) -> Result<Self, AnalyzerError> {
        let contamination = settings.contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(AnalyzerError::InvalidContamination(contamination));
        }

        Ok(Self {
            settings,
            ratio_engine: RatioEngine::default(),
            plot_style: PlotStyle::default(),
            visualizer,
            state: AnalyzerState::Idle,
            prepared: None,
        })
    }

    pub fn with_feature_settings(mut self, features: &FeatureSettings) -> Self {
        self.ratio_engine = RatioEngine::new(RatioWindows {
            short: features.short_window,
            long: features.long_window,
            rsi: features.rsi_period,
        });
        self
    }

    pub fn with_plot_style(mut self, plot_style: PlotStyle) -> Self {
        self.plot_style = plot_style;
        self
    }

    pub fn state(&self) -> AnalyzerState {
        self.state
    }

    /// Derives ratios from `raw` and assembles the feature matrix per `options`.
    pub fn prepare_features(
        &mut self,
        raw: &RawTable,
        options: &FeatureOptions,
    ) -> Result<&FeatureMatrix, AnalyzerError> {
        self.require("prepare features", AnalyzerState::Idle)?;

        let ratios = self.ratio_engine.derive(raw)?;
        let matrix = FeatureMatrixBuilder::build(raw, &ratios, options)?;
        tracing::info!(
            rows = matrix.nrows(),
            columns = ?matrix.labels(),
            "Features prepared"
        );

        self.state = AnalyzerState::FeaturesPrepared;
        let prepared = self.prepared.insert(Prepared {
            row_index: raw.index().to_vec(),
            matrix,
        });
        Ok(&prepared.matrix)
    }

    /// Fits an isolation forest on the prepared matrix and flags the most
    /// anomalous `contamination` share of rows.
    pub fn analyze(&mut self) -> Result<AnalysisResult, AnalyzerError> {
        self.require("analyze", AnalyzerState::FeaturesPrepared)?;
        let Some(prepared) = self.prepared.as_ref() else {
            return Err(AnalyzerError::ModelFitting("no feature matrix prepared".to_string()));
        };

        check_fittable(&prepared.matrix, self.settings.min_samples)?;

        let params = ForestParams {
            n_estimators: self.settings.n_estimators,
            max_samples: self.settings.max_samples,
            seed: self.settings.seed,
        };
        let forest = IsolationForest::fit(prepared.matrix.values(), &params);
        let anomaly_scores = forest.score_samples(prepared.matrix.values());

        let contamination = self.settings.contamination;
        let threshold = contamination_threshold(&anomaly_scores, contamination);
        let anomaly_flags: Vec<bool> = anomaly_scores.iter().map(|&s| s >= threshold).collect();

        let result = AnalysisResult {
            anomaly_scores,
            threshold,
            anomaly_flags,
            contamination,
            feature_matrix: prepared.matrix.clone(),
            row_index: prepared.row_index.clone(),
        };
        tracing::info!(
            rows = result.len(),
            anomalies = result.anomaly_count(),
            threshold = result.threshold,
            "Anomaly detection complete"
        );

        self.state = AnalyzerState::Scored;
        Ok(result)
    }

    /// Sends every plot for `result` to the visualizer.
    pub fn generate_plots(&mut self, result: &AnalysisResult) -> Result<(), AnalyzerError> {
        self.require("generate plots", AnalyzerState::Scored)?;

        let matrix = &result.feature_matrix;
        let labels = matrix.labels();
        let columns: Vec<(String, Vec<f64>)> = labels
            .into_iter()
            .enumerate()
            .map(|(idx, label)| (label, matrix.column(idx).to_vec()))
            .collect();

        for (label, values) in &columns {
            let plot = TimeSeriesPlot::new(
                label.as_str(),
                result.row_index.clone(),
                values.clone(),
                result.anomaly_flags.clone(),
            )?;
            let path = self.visualizer.time_series(&plot, &self.plot_style)?;
            tracing::debug!(feature = %label, path = %path.display(), "Time series plot generated");
        }

        let distribution = ScoreDistribution::new(
            result.anomaly_scores.clone(),
            result.threshold,
            self.plot_style.histogram_bins,
        );
        self.visualizer
            .score_distribution(&distribution, &self.plot_style)?;

        let correlation = CorrelationMatrix::from_columns(&columns)?;
        self.visualizer.correlation(&correlation, &self.plot_style)?;

        tracing::info!(plots = columns.len() + 2, "Visualizations generated");
        self.state = AnalyzerState::PlotsGenerated;
        Ok(())
    }

    fn require(&self, operation: &'static str, expected: AnalyzerState) -> Result<(), AnalyzerError> {
        if self.state != expected {
            return Err(AnalyzerError::InvalidState {
                operation,
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }
}

fn check_fittable(matrix: &FeatureMatrix, min_samples: usize) -> Result<(), AnalyzerError> {
    if matrix.nrows() < min_samples {
        return Err(AnalyzerError::ModelFitting(format!(
            "{} rows available, at least {min_samples} required",
            matrix.nrows()
        )));
    }

    if let Some(label) = matrix
        .labels()
        .into_iter()
        .enumerate()
        .find(|(idx, _)| matrix.column(*idx).iter().any(|v| !v.is_finite()))
        .map(|(_, label)| label)
    {
        return Err(AnalyzerError::ModelFitting(format!(
            "column '{label}' contains missing or non-finite values"
        )));
    }

    let varies = (0..matrix.ncols()).any(|idx| {
        let column = matrix.column(idx);
        column.iter().any(|&v| v != column[0])
    });
    if !varies {
        return Err(AnalyzerError::ModelFitting(
            "every feature column is constant".to_string(),
        ));
    }
    Ok(())
}
