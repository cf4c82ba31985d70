//! # Pipeline Worker
//!
//! Runs `prepare_features → analyze → generate_plots` off the caller's task.
//! A run reports back over a channel: one `Progress` event per phase, in
//! order, then exactly one `Completed` or `Failed`. A worker allows one run at
//! a time; `start` is rejected while a run is active.

use analyzer::{AnalysisResult, AnomalyAnalyzer};
use configuration::{AnalysisSettings, Config};
use core_types::{FeatureOptions, Phase};
use ml_features::RawTable;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;
use visualization::JsonArtifactWriter;

pub mod error;

pub use error::WorkerError;

/// Everything one run needs. Ownership moves to the worker for the run.
#[derive(Debug)]
pub struct RunRequest {
    pub raw: RawTable,
    pub options: FeatureOptions,
    pub contamination: f64,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Phase),
    Completed(Box<AnalysisResult>),
    Failed(String),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress(_))
    }
}

/// The caller's end of a run.
pub struct RunHandle {
    pub run_id: Uuid,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl RunHandle {
    /// The next event, or `None` once the terminal event has been consumed.
    pub async fn next(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Skips progress events and returns the outcome.
    pub async fn wait(mut self) -> Result<AnalysisResult, WorkerError> {
        while let Some(event) = self.next().await {
            match event {
                WorkerEvent::Progress(_) => {}
                WorkerEvent::Completed(result) => return Ok(*result),
                WorkerEvent::Failed(message) => return Err(WorkerError::RunFailed(message)),
            }
        }
        Err(WorkerError::Disconnected)
    }
}

pub struct PipelineWorker {
    config: Config,
    running: Arc<AtomicBool>,
}

impl PipelineWorker {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts a run on the current tokio runtime.
    ///
    /// The worker is free again before the terminal event is delivered, so a
    /// caller may start the next run as soon as it sees that event.
    pub fn start(&self, request: RunRequest) -> Result<RunHandle, WorkerError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WorkerError::AlreadyRunning);
        }

        let run_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::clone(&self.running);
        let config = self.config.clone();

        tracing::info!(%run_id, rows = request.raw.height(), "Starting analysis run");

        tokio::spawn(async move {
            let progress = tx.clone();
            let outcome =
                tokio::task::spawn_blocking(move || execute(request, &config, &progress)).await;

            let terminal = match outcome {
                Ok(Ok(result)) => {
                    tracing::info!(%run_id, anomalies = result.anomaly_count(), "Analysis run completed");
                    WorkerEvent::Completed(Box::new(result))
                }
                Ok(Err(e)) => {
                    tracing::error!(%run_id, error = %e, "Analysis run failed");
                    WorkerEvent::Failed(e.to_string())
                }
                Err(e) => {
                    tracing::error!(%run_id, error = %e, "Analysis task aborted");
                    WorkerEvent::Failed(format!("analysis task aborted: {e}"))
                }
            };

            running.store(false, Ordering::Release);
            // The caller may have dropped the handle.
            let _ = tx.send(terminal);
        });

        Ok(RunHandle { run_id, events: rx })
    }
}

fn execute(
    request: RunRequest,
    config: &Config,
    events: &mpsc::UnboundedSender<WorkerEvent>,
) -> Result<AnalysisResult, WorkerError> {
    let notify = |phase: Phase| {
        tracing::info!("{phase}...");
        let _ = events.send(WorkerEvent::Progress(phase));
    };

    notify(Phase::Initializing);
    let settings = AnalysisSettings {
        contamination: request.contamination,
        ..config.analysis.clone()
    };
    let writer = JsonArtifactWriter::create(&request.output_dir)?;
    let mut analyzer = AnomalyAnalyzer::new(settings, Box::new(writer))?
        .with_feature_settings(&config.features)
        .with_plot_style(config.plot_style.clone());

    notify(Phase::ProcessingFeatures);
    analyzer.prepare_features(&request.raw, &request.options)?;

    notify(Phase::RunningDetection);
    let result = analyzer.analyze()?;

    notify(Phase::GeneratingVisualizations);
    analyzer.generate_plots(&result)?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::FeatureSelection;

    fn request(dir: &std::path::Path, options: FeatureOptions) -> RunRequest {
        let close: Vec<f64> = (0..40)
            .map(|i| if i == 25 { 500.0 } else { 50.0 + i as f64 })
            .collect();
        RunRequest {
            raw: RawTable::from_columns([("Close", close)]).unwrap(),
            options,
            contamination: 0.1,
            output_dir: dir.to_path_buf(),
        }
    }

    async fn drain(mut handle: RunHandle) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Some(event) = handle.next().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_events_arrive_in_phase_order_then_completion() {
        let dir = tempfile::tempdir().unwrap();
        let worker = PipelineWorker::new(Config::default());
        let handle = worker
            .start(request(dir.path(), FeatureOptions::with_defaults(["Close"])))
            .unwrap();

        let events = drain(handle).await;
        assert_eq!(events.len(), 5);

        let phases: Vec<Phase> = events
            .iter()
            .filter_map(|e| match e {
                WorkerEvent::Progress(phase) => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, Phase::ALL.to_vec());

        match &events[4] {
            WorkerEvent::Completed(result) => {
                assert!(result.anomaly_flags[25]);
                assert_eq!(result.len(), 40);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(dir.path().join("close_anomalies.json").is_file());
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_empty_selection_reports_single_failure() {
        let dir = tempfile::tempdir().unwrap();
        let worker = PipelineWorker::new(Config::default());
        let options: FeatureOptions = [("Close", FeatureSelection::none())].into_iter().collect();
        let events = drain(worker.start(request(dir.path(), options)).unwrap()).await;

        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        match events.last() {
            Some(WorkerEvent::Failed(message)) => {
                assert!(message.contains("No features selected for analysis"), "{message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(
            &events[..events.len() - 1],
            [
                WorkerEvent::Progress(Phase::Initializing),
                WorkerEvent::Progress(Phase::ProcessingFeatures)
            ]
        ));
    }

    #[tokio::test]
    async fn test_second_start_is_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let worker = PipelineWorker::new(Config::default());
        let first = worker
            .start(request(dir.path(), FeatureOptions::with_defaults(["Close"])))
            .unwrap();

        assert!(worker.is_running());
        assert!(matches!(
            worker.start(request(dir.path(), FeatureOptions::with_defaults(["Close"]))),
            Err(WorkerError::AlreadyRunning)
        ));

        first.wait().await.unwrap();
        let second = worker
            .start(request(dir.path(), FeatureOptions::with_defaults(["Close"])))
            .unwrap();
        assert!(second.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_surfaces_failure_message() {
        let dir = tempfile::tempdir().unwrap();
        let worker = PipelineWorker::new(Config::default());
        let mut req = request(dir.path(), FeatureOptions::with_defaults(["Close"]));
        req.contamination = 0.9;

        match worker.start(req).unwrap().wait().await {
            Err(WorkerError::RunFailed(message)) => assert!(message.contains("0.9"), "{message}"),
            other => panic!("expected run failure, got {other:?}"),
        }
    }
}
