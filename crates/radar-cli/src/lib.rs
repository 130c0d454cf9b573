//! # radar-cli — CLI Tool for PolicyRadar
//!
//! Provides the `radar` command-line interface for working with datasets
//! offline, without the API service.
//!
//! ## Subcommands
//!
//! - `radar generate`: Write a seeded synthetic dataset to a directory.
//! - `radar assess`: Run the impact engine over a dataset.
//! - `radar forecast`: Issue one prediction from a dataset's history.
//! - `radar backtest`: Rolling-origin accuracy of the smoothing model.
//!
//! ```bash
//! radar generate --out data --seed 7 --policies 200 --companies 100
//! radar assess --data data --period 2025-2026 --out assessments.json
//! radar forecast --data data --jurisdiction US --kind risk --horizon 6
//! radar backtest --data data --jurisdiction EU --horizon 3
//! ```

pub mod assess;
pub mod backtest;
pub mod forecast;
pub mod generate;

use std::path::Path;

use anyhow::{Context, Result};
use radar_core::Settings;
use radar_synth::Dataset;

/// Settings from the environment, overlaid with `config` when given.
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    match config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display())),
        None => Settings::from_env().context("failed to load settings from the environment"),
    }
}

/// Read and validate a dataset directory written by `radar generate`.
pub fn load_dataset(dir: &Path) -> Result<Dataset> {
    let dataset = Dataset::load_dir(dir)
        .with_context(|| format!("failed to load dataset from {}", dir.display()))?;
    tracing::info!(
        dir = %dir.display(),
        policies = dataset.policies.len(),
        companies = dataset.companies.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{text}");
    Ok(())
}
