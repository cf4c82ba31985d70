use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize plot data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid plot data: {0}")]
    InvalidData(String),
}
