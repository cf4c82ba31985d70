use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global tracing subscriber.
///
/// Events go to stdout and to a timestamped file in `settings.log_dir`
/// (`anomaly_detector_<YYYYmmdd_HHMMSS>.log`). `RUST_LOG` overrides the
/// configured level. The returned guard flushes the file writer when dropped,
/// so the caller must keep it alive for the lifetime of the program.
pub fn init_logging(settings: &LoggingSettings) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|e| {
        ConfigError::Logging(format!(
            "cannot create log directory {}: {e}",
            settings.log_dir.display()
        ))
    })?;

    let file_name = format!(
        "anomaly_detector_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let file_appender = tracing_appender::rolling::never(&settings.log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Logging(format!("invalid log level '{}': {e}", settings.level)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::info!("Logging initialized");
    Ok(guard)
}
