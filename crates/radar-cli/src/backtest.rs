//! # Backtest Subcommand
//!
//! Rolling-origin evaluation of the smoothing model on a dataset's monthly
//! policy series. Reports MAPE and interval coverage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use radar_core::{JurisdictionCode, Settings};
use radar_forecast::forecaster::DEFAULT_CONFIDENCE;
use radar_forecast::{backtest, monthly_series, BacktestReport, SeriesKind};
use radar_synth::Dataset;
use serde::Serialize;

/// Series to replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SeriesArg {
    /// Monthly sum of estimated impact.
    Impact,
    /// Monthly share of high-risk policies.
    Risk,
    /// Monthly count of proposed policies.
    Count,
}

impl From<SeriesArg> for SeriesKind {
    fn from(arg: SeriesArg) -> Self {
        match arg {
            SeriesArg::Impact => SeriesKind::Impact,
            SeriesArg::Risk => SeriesKind::Risk,
            SeriesArg::Count => SeriesKind::Count,
        }
    }
}

/// Arguments for the `radar backtest` subcommand.
#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Dataset directory written by `radar generate`.
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// Jurisdiction code, e.g. `US` or `EU`.
    #[arg(long)]
    pub jurisdiction: String,

    /// Restrict the series to one industry.
    #[arg(long)]
    pub industry: Option<String>,

    /// Steps ahead, in months.
    #[arg(long, default_value_t = 6)]
    pub horizon: u32,

    /// Shortest training window, in months.
    #[arg(long, default_value_t = 6)]
    pub min_train: usize,

    /// Series to replay.
    #[arg(long, value_enum, default_value_t = SeriesArg::Impact)]
    pub series: SeriesArg,

    /// Nominal interval level in (0, 1).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,
}

/// Backtest output with the series it ran on.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestOutput {
    pub jurisdiction: String,
    pub industry: Option<String>,
    pub series: SeriesKind,
    /// Months in the series.
    pub months: usize,
    #[serde(flatten)]
    pub report: BacktestReport,
}

/// Build the series for `args` and backtest it.
pub fn backtest_dataset(dataset: &Dataset, args: &BacktestArgs) -> Result<BacktestOutput> {
    let jurisdiction = JurisdictionCode::new(&args.jurisdiction)
        .with_context(|| format!("invalid --jurisdiction {}", args.jurisdiction))?;
    let kind = SeriesKind::from(args.series);
    let series = monthly_series(
        &dataset.policies,
        jurisdiction.as_str(),
        args.industry.as_deref(),
        kind,
        None,
    );
    let report = backtest(&series.values, args.horizon, args.min_train, args.confidence)
        .with_context(|| {
            format!("backtest failed for {} ({} months)", jurisdiction, series.len())
        })?;
    Ok(BacktestOutput {
        jurisdiction: jurisdiction.as_str().to_string(),
        industry: args.industry.clone(),
        series: kind,
        months: series.len(),
        report,
    })
}

/// Execute the backtest subcommand.
///
/// Returns exit code 0 on success.
pub fn run_backtest(args: &BacktestArgs, _settings: &Settings) -> Result<u8> {
    let dataset = crate::load_dataset(&args.data)?;
    let output = backtest_dataset(&dataset, args)?;
    tracing::info!(
        jurisdiction = %output.jurisdiction,
        origins = output.report.origins,
        mape = ?output.report.mape,
        coverage = ?output.report.coverage,
        "Backtest complete"
    );
    crate::print_json(&output)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_synth::{GeneratorConfig, SyntheticGenerator};

    fn args(jurisdiction: &str, horizon: u32) -> BacktestArgs {
        BacktestArgs {
            data: PathBuf::from("unused"),
            jurisdiction: jurisdiction.to_string(),
            industry: None,
            horizon,
            min_train: 6,
            series: SeriesArg::Count,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    #[test]
    fn backtests_a_generated_history() {
        let dataset = SyntheticGenerator::new(GeneratorConfig {
            seed: 3,
            policies: 400,
            companies: 5,
            market_days: 5,
            workers: 2,
            ..GeneratorConfig::default()
        })
        .unwrap()
        .generate()
        .unwrap();
        let jurisdiction = dataset.policies[0].jurisdiction.as_str().to_string();

        let out = backtest_dataset(&dataset, &args(&jurisdiction, 3)).unwrap();
        assert!(out.months >= 9);
        assert!(out.report.origins > 0);
        let coverage = out.report.coverage.unwrap();
        assert!((0.0..=1.0).contains(&coverage));
    }

    #[test]
    fn short_history_is_an_error() {
        let out = backtest_dataset(&Dataset::default(), &args("US", 3));
        assert!(out.is_err());
    }
}
