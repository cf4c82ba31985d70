use analyzer::AnalysisResult;
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::{Config, init_logging, load_config, load_config_from};
use core_types::FeatureOptions;
use indicatif::{ProgressBar, ProgressStyle};
use ml_features::RawTable;
use std::path::{Path, PathBuf};
use std::time::Duration;
use worker::{PipelineWorker, RunRequest, WorkerEvent};

/// The main entry point for the anomaly detector.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Columns(args) => handle_columns(args),
        Commands::Analyze(args) => handle_analyze(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Feature engineering and isolation-forest anomaly scoring for tabular market data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the numeric columns of an input file.
    Columns(ColumnsArgs),
    /// Derive features, score every row, and write plot artifacts.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct ColumnsArgs {
    /// Input table (.csv or .parquet).
    #[arg(long)]
    input: PathBuf,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Input table (.csv or .parquet).
    #[arg(long)]
    input: PathBuf,

    /// Directory for plot artifacts. Defaults to `output.plot_dir` from the configuration.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Configuration file. Defaults to `config.toml` in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expected share of anomalous rows, in (0, 0.5].
    #[arg(long)]
    contamination: Option<f64>,

    /// Features to analyze, comma separated. Defaults to every numeric column.
    #[arg(long, value_delimiter = ',')]
    features: Vec<String>,

    /// Features whose raw column is excluded.
    #[arg(long, value_delimiter = ',')]
    no_raw: Vec<String>,

    /// Features whose derived ratio column is excluded.
    #[arg(long, value_delimiter = ',')]
    no_ratio: Vec<String>,

    /// Number of ranked anomalies to print.
    #[arg(long, default_value_t = 10)]
    top: usize,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_columns(args: ColumnsArgs) -> anyhow::Result<()> {
    let columns = data_source::numeric_columns(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    for column in columns {
        println!("{column}");
    }
    Ok(())
}

async fn handle_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let raw = data_source::load_table(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let options = build_options(&raw, &args)?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.output.plot_dir.clone());

    tracing::info!(
        contamination = config.analysis.contamination,
        features = ?options.names().collect::<Vec<_>>(),
        output = %output_dir.display(),
        "Starting analysis"
    );

    let worker = PipelineWorker::new(config.clone());
    let mut handle = worker.start(RunRequest {
        raw,
        options,
        contamination: config.analysis.contamination,
        output_dir: output_dir.clone(),
    })?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    while let Some(event) = handle.next().await {
        match event {
            WorkerEvent::Progress(phase) => spinner.set_message(phase.label()),
            WorkerEvent::Completed(result) => {
                spinner.finish_with_message("Analysis complete");
                print_report(&result, args.top, &output_dir);
                return Ok(());
            }
            WorkerEvent::Failed(message) => {
                spinner.abandon_with_message("Analysis failed");
                bail!(message);
            }
        }
    }

    bail!("Run {} ended without a result", handle.run_id)
}

/// File values, then environment, then command-line flags.
fn resolve_config(args: &AnalyzeArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    if let Some(contamination) = args.contamination {
        config.analysis.contamination = contamination;
        config.validate().context("Invalid --contamination")?;
    }
    Ok(config)
}

fn build_options(raw: &RawTable, args: &AnalyzeArgs) -> anyhow::Result<FeatureOptions> {
    let mut options = if args.features.is_empty() {
        FeatureOptions::with_defaults(raw.column_names())
    } else {
        FeatureOptions::with_defaults(args.features.iter().cloned())
    };

    for name in &args.no_raw {
        options.set_use_raw(name, false).context("Invalid --no-raw")?;
    }
    for name in &args.no_ratio {
        options.set_use_ratio(name, false).context("Invalid --no-ratio")?;
    }
    Ok(options)
}

fn print_report(result: &AnalysisResult, top: usize, output_dir: &Path) {
    let labels = result.feature_matrix.labels();
    println!(
        "Rows analyzed: {}    Feature columns: {}",
        result.len(),
        labels.join(", ")
    );
    println!(
        "Anomalies: {} ({:.1}%)    Threshold: {:.4}    Contamination: {}",
        result.anomaly_count(),
        result.anomaly_rate() * 100.0,
        result.threshold,
        result.contamination
    );

    let mut header = vec!["Rank".to_string(), "Row".to_string(), "Score".to_string()];
    header.extend(labels);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);

    let values = result.feature_matrix.values();
    for (rank, anomaly) in result.ranked_anomalies().iter().take(top).enumerate() {
        let mut row = vec![
            (rank + 1).to_string(),
            anomaly.key.to_string(),
            format!("{:.4}", anomaly.score),
        ];
        row.extend(values.row(anomaly.row).iter().map(|v| format!("{v:.4}")));
        table.add_row(row);
    }

    println!("{table}");
    println!("Artifacts written to {}", output_dir.display());
}
