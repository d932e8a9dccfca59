use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use u_capability::ingest::read_path;
use u_capability::{AnalysisError, AnalyzerConfig, CapabilityAnalyzer, DirStore};

#[derive(Parser, Debug)]
#[command(name = "u-capability")]
#[command(about = "Process capability indices and SPC charts for a measurement column")]
#[command(version)]
struct Args {
    /// CSV or spreadsheet file with a header row
    file: PathBuf,

    /// Name of the measurement column [default: Measurement]
    #[arg(short, long)]
    column: Option<String>,

    /// Subgroup size for the X̄ and R charts [default: 5]
    #[arg(short = 'k', long)]
    subgroup_size: Option<usize>,

    /// Directory the chart PNGs are written to
    #[arg(short, long, default_value = "uploads")]
    out: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "u_capability=debug"
    } else if quiet {
        "error"
    } else {
        "u_capability=info"
    };
    let filter = EnvFilter::try_from_env("U_CAPABILITY_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<AnalyzerConfig> {
    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    if let Some(column) = &args.column {
        config.column = column.clone();
    }
    if let Some(k) = args.subgroup_size {
        config.subgroup_size = k;
    }
    config.validate()?;
    Ok(config)
}

fn run_analysis(args: &Args, config: AnalyzerConfig) -> Result<serde_json::Value, AnalysisError> {
    let series = read_path(&args.file, &config.column)?;
    let analyzer = CapabilityAnalyzer::new(config).with_store(Arc::new(DirStore::new(&args.out)));
    let outcome = analyzer.analyze(series.values())?;
    Ok(outcome.response_json())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err:#}");
            print_json(&serde_json::json!({ "error": format!("{err:#}") }))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::debug!(?config, file = %args.file.display(), "starting analysis");

    match run_analysis(&args, config) {
        Ok(body) => {
            print_json(&body)?;
            tracing::info!(out = %args.out.display(), "charts written");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(status = err.http_status(), "{err}");
            print_json(&err.to_response_json())?;
            Ok(ExitCode::FAILURE)
        }
    }
}
