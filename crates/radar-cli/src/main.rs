//! # radar CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use radar_cli::assess::{run_assess, AssessArgs};
use radar_cli::backtest::{run_backtest, BacktestArgs};
use radar_cli::forecast::{run_forecast, ForecastArgs};
use radar_cli::generate::{run_generate, GenerateArgs};

/// PolicyRadar CLI
///
/// Generates synthetic datasets and runs the impact and prediction engines
/// over them without the API service.
#[derive(Parser, Debug)]
#[command(name = "radar", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON settings file overlaid on the environment.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a seeded synthetic dataset.
    Generate(GenerateArgs),

    /// Run the impact engine over a dataset and summarise risk levels.
    Assess(AssessArgs),

    /// Issue one prediction from a dataset's policy history.
    Forecast(ForecastArgs),

    /// Rolling-origin backtest of the smoothing model.
    Backtest(BacktestArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. Logs go to stderr so
    // stdout carries only JSON output.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = match radar_cli::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(settings = ?settings, "settings resolved");

    let result = match cli.command {
        Commands::Generate(args) => run_generate(&args, &settings),
        Commands::Assess(args) => run_assess(&args, &settings),
        Commands::Forecast(args) => run_forecast(&args, &settings),
        Commands::Backtest(args) => run_backtest(&args, &settings),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
