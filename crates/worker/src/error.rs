use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("An analysis run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Analyzer(#[from] analyzer::error::AnalyzerError),

    #[error("Could not prepare the output directory: {0}")]
    Output(#[from] visualization::VisualizationError),

    #[error("Analysis failed: {0}")]
    RunFailed(String),

    #[error("The worker stopped without reporting a result")]
    Disconnected,
}
