use crate::AnalyzerState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Feature preparation failed: {0}")]
    Input(#[from] ml_features::FeatureError),

    #[error("Cannot {operation} while {actual:?}; expected {expected:?}")]
    InvalidState {
        operation: &'static str,
        expected: AnalyzerState,
        actual: AnalyzerState,
    },

    #[error("Anomaly model could not be fitted: {0}")]
    ModelFitting(String),

    #[error("Contamination must be in (0, 0.5], got {0}")]
    InvalidContamination(f64),

    #[error("Visualization failed: {0}")]
    Visualization(#[from] visualization::VisualizationError),
}
