use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub features: FeatureSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
    pub plot_style: PlotStyle,
}

/// Parameters for the anomaly-scoring model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Expected fraction of anomalous rows. 0.1 corresponds to 10%.
    pub contamination: f64,
    /// Number of isolation trees in the forest.
    pub n_estimators: usize,
    /// Rows sampled per tree. `None` means `min(256, n)`.
    pub max_samples: Option<usize>,
    /// Fewer rows than this is a fitting error.
    pub min_samples: usize,
    /// Seed for the tree sampler; the same seed and input give the same result.
    pub seed: u64,
}

/// Rolling window lengths used when deriving ratio columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Default destination for plot artifacts when none is given on the command line.
    pub plot_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: PathBuf,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

/// Presentation settings handed to the visualization collaborator with every plot.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlotStyle {
    pub style: String,
    pub palette: String,
    pub dpi: u32,
    /// Figure width in inches.
    pub width: f64,
    /// Figure height in inches.
    pub height: f64,
    pub histogram_bins: usize,
}

// --- Default Implementations ---
// These allow a user to omit any section from their toml
// and still have it work with sensible defaults.

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            contamination: 0.1,
            n_estimators: 100,
            max_samples: None,
            min_samples: 20,
            seed: 42,
        }
    }
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            rsi_period: 14,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            plot_dir: PathBuf::from("plots"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            style: "seaborn".to_string(),
            palette: "husl".to_string(),
            dpi: 300,
            width: 12.0,
            height: 6.0,
            histogram_bins: 50,
        }
    }
}

impl Config {
    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.features.validate()?;

        if self.plot_style.histogram_bins == 0 {
            return Err(ConfigError::ValidationError(
                "plot_style.histogram_bins must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ConfigError::ValidationError(format!(
                "analysis.contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        if self.n_estimators == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples < 2 {
            return Err(ConfigError::ValidationError(
                "analysis.min_samples must be at least 2".to_string(),
            ));
        }
        if self.max_samples == Some(0) {
            return Err(ConfigError::ValidationError(
                "analysis.max_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl FeatureSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("rsi_period", self.rsi_period),
        ] {
            if window < 2 {
                return Err(ConfigError::ValidationError(format!(
                    "features.{name} must be at least 2, got {window}"
                )));
            }
        }
        Ok(())
    }
}
