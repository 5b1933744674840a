//! Command-line entry point: `train` and `predict` print a JSON result on
//! stdout, logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use season_forecast::config::ForecastConfig;
use season_forecast::workflow::{predict_workflow, train_workflow};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "season-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seasonal demand forecasting and purchase planning", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory of persisted models, overrides the configuration
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train and register a model for each season type
    Train(TrainArgs),
    /// Forecast the next season and build its purchase plan
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Order history CSV
    dataset: PathBuf,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Order history CSV
    dataset: PathBuf,

    /// next_PV or next_OI
    target: String,

    /// Number of stores, overrides the configuration
    store_count: Option<usize>,

    /// Also write SKU-level predictions to this CSV file
    #[arg(long)]
    predictions_out: Option<PathBuf>,
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("season_forecast=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")
}

fn load_config(cli: &Cli) -> Result<ForecastConfig> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    if let Some(dir) = &cli.model_dir {
        config.model_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    let mut config = load_config(&cli)?;

    let output = match cli.command {
        Commands::Train(args) => {
            let report = train_workflow(&args.dataset, &config);
            serde_json::to_string_pretty(&report)?
        }
        Commands::Predict(args) => {
            if let Some(stores) = args.store_count {
                config.plan.store_count = stores;
            }
            let report = predict_workflow(
                &args.dataset,
                &args.target,
                &config,
                args.predictions_out.as_deref(),
            );
            serde_json::to_string_pretty(&report)?
        }
    };
    println!("{}", output);
    Ok(())
}
