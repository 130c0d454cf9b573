//! # Generate Subcommand
//!
//! Draws a synthetic dataset from one seed and writes it as JSON and CSV,
//! with a `generation_summary.json`. Assessments in the dataset come from
//! the real impact engine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use radar_core::Settings;
use radar_synth::{write_dir, GeneratorConfig, SyntheticGenerator};

/// Arguments for the `radar generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Output directory. Created if missing.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// RNG seed. The same seed and sizes reproduce the same dataset.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of policies.
    #[arg(long, default_value_t = 1000)]
    pub policies: usize,

    /// Number of companies.
    #[arg(long, default_value_t = 500)]
    pub companies: usize,

    /// Trading days of market data per symbol.
    #[arg(long, default_value_t = 1000)]
    pub market_days: usize,

    /// First date of the generated history (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date of the generated history (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl GenerateArgs {
    /// Generator configuration for these arguments.
    pub fn config(&self, settings: &Settings) -> GeneratorConfig {
        let defaults = GeneratorConfig::default();
        GeneratorConfig {
            seed: self.seed,
            policies: self.policies,
            companies: self.companies,
            market_days: self.market_days,
            start: self.start.unwrap_or(defaults.start),
            end: self.end.unwrap_or(defaults.end),
            workers: settings.max_workers,
            ..defaults
        }
    }
}

/// Execute the generate subcommand.
///
/// Returns exit code 0 on success.
pub fn run_generate(args: &GenerateArgs, settings: &Settings) -> Result<u8> {
    let config = args.config(settings);
    let generator =
        SyntheticGenerator::new(config.clone()).context("invalid generator configuration")?;
    let dataset = generator.generate().context("dataset generation failed")?;

    let summary = dataset.summary(config.seed, config.start, config.end, Utc::now());
    write_dir(&dataset, &args.out, &summary)
        .with_context(|| format!("failed to write dataset to {}", args.out.display()))?;

    tracing::info!(
        out = %args.out.display(),
        records = summary.total_records,
        "Dataset written"
    );
    crate::print_json(&summary)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(out: PathBuf) -> GenerateArgs {
        GenerateArgs {
            out,
            seed: 7,
            policies: 12,
            companies: 8,
            market_days: 10,
            start: NaiveDate::from_ymd_opt(2022, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 12, 31),
        }
    }

    #[test]
    fn config_takes_sizes_and_workers() {
        let settings = Settings {
            max_workers: 2,
            ..Settings::default()
        };
        let config = args(PathBuf::from("unused")).config(&settings);
        assert_eq!(config.seed, 7);
        assert_eq!(config.policies, 12);
        assert_eq!(config.workers, 2);
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    }

    #[test]
    fn writes_a_loadable_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let code = run_generate(&args(out.clone()), &Settings::default()).unwrap();
        assert_eq!(code, 0);

        let dataset = crate::load_dataset(&out).unwrap();
        assert_eq!(dataset.policies.len(), 12);
        assert_eq!(dataset.companies.len(), 8);
    }
}
