//! # Forecast Subcommand
//!
//! Runs one registered model over a dataset's policy history and prints
//! the resulting prediction as JSON. The prediction is not stored.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, ValueEnum};
use radar_core::{JurisdictionCode, Prediction, PredictionType, Settings};
use radar_forecast::forecaster::DEFAULT_CONFIDENCE;
use radar_forecast::{ForecastContext, ForecastRequest, Forecaster};
use radar_synth::Dataset;
use uuid::Uuid;

use crate::assess::ScenarioArg;

/// Prediction kinds accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ForecastKind {
    /// Aggregate estimated impact (Holt smoothing).
    Impact,
    /// Share of high-risk policies (Holt smoothing).
    Risk,
    /// Probability of a policy change (hazard model).
    Change,
    /// Months until a policy takes effect.
    Timeline,
}

impl From<ForecastKind> for PredictionType {
    fn from(kind: ForecastKind) -> Self {
        match kind {
            ForecastKind::Impact => PredictionType::ImpactForecast,
            ForecastKind::Risk => PredictionType::RiskAssessment,
            ForecastKind::Change => PredictionType::PolicyChange,
            ForecastKind::Timeline => PredictionType::TimelinePrediction,
        }
    }
}

/// Arguments for the `radar forecast` subcommand.
#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Dataset directory written by `radar generate`.
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// Jurisdiction code, e.g. `US` or `EU`.
    #[arg(long)]
    pub jurisdiction: String,

    /// Restrict the history to one industry.
    #[arg(long)]
    pub industry: Option<String>,

    /// Months ahead. Defaults to the configured prediction horizon.
    #[arg(long)]
    pub horizon: Option<u32>,

    /// What to forecast.
    #[arg(long, value_enum, default_value_t = ForecastKind::Impact)]
    pub kind: ForecastKind,

    /// Target policy. Required for `timeline`.
    #[arg(long)]
    pub policy: Option<Uuid>,

    /// Nominal interval level in (0, 1).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,

    /// Scenario label carried onto the prediction.
    #[arg(long, value_enum, default_value_t = ScenarioArg::Baseline)]
    pub scenario: ScenarioArg,

    /// Forecast origin (YYYY-MM-DD). Only history up to this date is used.
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

impl ForecastArgs {
    /// Build the model request.
    pub fn request(&self, settings: &Settings, now: DateTime<Utc>) -> Result<ForecastRequest> {
        if self.kind == ForecastKind::Timeline && self.policy.is_none() {
            bail!("--policy is required for --kind timeline");
        }
        let jurisdiction = JurisdictionCode::new(&self.jurisdiction)
            .with_context(|| format!("invalid --jurisdiction {}", self.jurisdiction))?;
        let as_of = match self.as_of {
            Some(date) => date
                .and_hms_opt(23, 59, 59)
                .map(|dt| dt.and_utc())
                .context("invalid --as-of date")?,
            None => now,
        };

        let mut request = ForecastRequest::new(self.kind.into(), jurisdiction, as_of)
            .with_horizon(self.horizon.unwrap_or(settings.prediction_horizon_months))
            .with_confidence(self.confidence);
        if let Some(industry) = &self.industry {
            request = request.with_industry(industry.clone());
        }
        if let Some(policy_id) = self.policy {
            request = request.with_policy(policy_id);
        }
        request.scenario = self.scenario.into();
        Ok(request)
    }
}

/// Run the registered model for `request` over the dataset history.
pub fn forecast_dataset(dataset: &Dataset, request: &ForecastRequest) -> Result<Prediction> {
    let forecaster = Forecaster::default();
    let ctx = ForecastContext {
        policies: &dataset.policies,
        changes: &dataset.policy_changes,
    };
    forecaster
        .run(request, ctx, Uuid::new_v4())
        .context("forecast failed")
}

/// Execute the forecast subcommand.
///
/// Returns exit code 0 on success.
pub fn run_forecast(args: &ForecastArgs, settings: &Settings) -> Result<u8> {
    let request = args.request(settings, Utc::now())?;
    let dataset = crate::load_dataset(&args.data)?;
    let prediction = forecast_dataset(&dataset, &request)?;
    crate::print_json(&prediction)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::Scenario;

    fn args(kind: ForecastKind) -> ForecastArgs {
        ForecastArgs {
            data: PathBuf::from("unused"),
            jurisdiction: "us".to_string(),
            industry: None,
            horizon: None,
            kind,
            policy: None,
            confidence: DEFAULT_CONFIDENCE,
            scenario: ScenarioArg::Pessimistic,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 30),
        }
    }

    #[test]
    fn request_uses_configured_horizon() {
        let settings = Settings {
            prediction_horizon_months: 9,
            ..Settings::default()
        };
        let req = args(ForecastKind::Risk).request(&settings, Utc::now()).unwrap();
        assert_eq!(req.prediction_type, PredictionType::RiskAssessment);
        assert_eq!(req.horizon_months, 9);
        assert_eq!(req.jurisdiction.as_str(), "US");
        assert_eq!(req.scenario, Scenario::Pessimistic);
        assert_eq!(req.as_of.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn timeline_requires_policy() {
        let err = args(ForecastKind::Timeline)
            .request(&Settings::default(), Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("--policy"));
    }

    #[test]
    fn bad_jurisdiction_rejected() {
        let mut a = args(ForecastKind::Impact);
        a.jurisdiction = "not valid".to_string();
        assert!(a.request(&Settings::default(), Utc::now()).is_err());
    }
}
