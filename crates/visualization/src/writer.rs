use crate::error::VisualizationError;
use crate::plots::{CorrelationMatrix, ScoreDistribution, TimeSeriesPlot};
use crate::{PlotStyle, Visualizer};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The on-disk shape of every artifact: what to draw and how to style it.
#[derive(Serialize)]
struct Artifact<'a, T: Serialize> {
    kind: &'static str,
    style: &'a PlotStyle,
    data: &'a T,
}

/// Writes each plot as a JSON document into a directory.
///
/// Time series whose names collide after normalization (`Close` and `close`)
/// get a numeric suffix instead of overwriting each other.
#[derive(Debug)]
pub struct JsonArtifactWriter {
    output_dir: PathBuf,
    series_names: Mutex<HashSet<String>>,
}

impl JsonArtifactWriter {
    /// Creates the writer, creating `output_dir` if needed.
    pub fn create(output_dir: impl Into<PathBuf>) -> Result<Self, VisualizationError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| VisualizationError::Io {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self {
            output_dir,
            series_names: Mutex::new(HashSet::new()),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write<T: Serialize>(
        &self,
        file_name: &str,
        kind: &'static str,
        style: &PlotStyle,
        data: &T,
    ) -> Result<PathBuf, VisualizationError> {
        let path = self.output_dir.join(file_name);
        let file = File::create(&path).map_err(|source| VisualizationError::Io {
            path: path.clone(),
            source,
        })?;

        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, &Artifact { kind, style, data })?;
        out.flush().map_err(|source| VisualizationError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), kind, "Artifact written");
        Ok(path)
    }

    /// First unused slug for `feature_name`: `close`, then `close_2`, `close_3`, ...
    fn claim_series_slug(&self, feature_name: &str) -> String {
        let slug = series_slug(feature_name);
        let mut used = self
            .series_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut candidate = slug.clone();
        let mut n = 1;
        while !used.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{slug}_{n}");
        }
        candidate
    }
}

fn series_slug(feature_name: &str) -> String {
    feature_name.to_lowercase().replace(' ', "_")
}

/// `Close Price` -> `close_price_anomalies.json`
pub fn time_series_file_name(feature_name: &str) -> String {
    format!("{}_anomalies.json", series_slug(feature_name))
}

impl Visualizer for JsonArtifactWriter {
    fn time_series(
        &self,
        plot: &TimeSeriesPlot,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError> {
        let slug = self.claim_series_slug(&plot.feature_name);
        self.write(&time_series_file_name(&slug), "time_series", style, plot)
    }

    fn score_distribution(
        &self,
        plot: &ScoreDistribution,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError> {
        self.write("score_distribution.json", "score_distribution", style, plot)
    }

    fn correlation(
        &self,
        plot: &CorrelationMatrix,
        style: &PlotStyle,
    ) -> Result<PathBuf, VisualizationError> {
        self.write("feature_correlation.json", "feature_correlation", style, plot)
    }
}
