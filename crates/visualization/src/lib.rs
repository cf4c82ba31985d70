//! # Visualization
//!
//! The output side of the pipeline. The analyzer hands over plain plot data
//! (a time series with its anomaly flags, the score distribution, the feature
//! correlation matrix) together with an explicit `PlotStyle`; how that becomes
//! an artifact is up to the `Visualizer` implementation.
//!
//! `JsonArtifactWriter` is the bundled implementation. It writes one JSON
//! document per plot into an output directory, ready for any renderer.

pub mod error;
pub mod plots;
pub mod writer;

pub use configuration::PlotStyle;
pub use error::VisualizationError;
pub use plots::{CorrelationMatrix, HistogramBin, ScoreDistribution, TimeSeriesPlot};
pub use writer::JsonArtifactWriter;

use std::path::PathBuf;

/// Produces artifacts from plot data.
///
/// Each method returns the location of the artifact it wrote.
pub trait Visualizer: Send {
    fn time_series(
        &self,
        plot: &TimeSeriesPlot,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError>;

    fn score_distribution(
        &self,
        plot: &ScoreDistribution,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError>;

    fn correlation(
        &self,
        plot: &CorrelationMatrix,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError>;
}
