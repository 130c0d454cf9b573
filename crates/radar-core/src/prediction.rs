//! # Prediction Records
//!
//! Predictions are immutable once issued. A newer prediction for the same
//! [`PredictionKey`] supersedes the previous one by reference, and realised
//! values are recorded as separate [`PredictionOutcome`] rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impact::Scenario;
use crate::jurisdiction::JurisdictionCode;

/// What a prediction forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    /// Expected number of amendments or repeals within the horizon.
    PolicyChange,
    /// Monthly aggregate estimated impact.
    ImpactForecast,
    /// Monthly share of high-risk policies.
    RiskAssessment,
    /// Months from proposal to enactment.
    TimelinePrediction,
}

impl PredictionType {
    /// Every prediction type.
    pub const ALL: [PredictionType; 4] = [
        Self::PolicyChange,
        Self::ImpactForecast,
        Self::RiskAssessment,
        Self::TimelinePrediction,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PolicyChange => "policy_change",
            Self::ImpactForecast => "impact_forecast",
            Self::RiskAssessment => "risk_assessment",
            Self::TimelinePrediction => "timeline_prediction",
        }
    }
}

/// Processing status. Stored predictions are always `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Queued.
    Pending,
    /// Running.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Model run failed.
    Failed,
    /// Withdrawn before completion.
    Cancelled,
}

/// Model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Time-series smoothing or ARIMA-style models.
    TimeSeries,
    /// Classifiers.
    Classification,
    /// Regression and empirical-distribution models.
    Regression,
    /// Text models.
    Nlp,
    /// Model combinations.
    Ensemble,
    /// Neural networks.
    DeepLearning,
    /// Count and hazard models.
    Econometric,
}

/// One step of a forecast trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ForecastPoint {
    /// Steps ahead of the forecast origin (1-based, months).
    pub period: u32,
    /// Point forecast.
    pub value: f64,
    /// Lower interval bound.
    pub lower: f64,
    /// Upper interval bound.
    pub upper: f64,
}

/// Supersession key: a newer prediction with the same key replaces the
/// current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PredictionKey {
    /// Prediction type.
    pub prediction_type: PredictionType,
    /// Target policy, if any.
    pub target_policy_id: Option<Uuid>,
    /// Target jurisdiction.
    pub target_jurisdiction: String,
    /// Target industry, if any.
    pub target_industry: Option<String>,
    /// Model that produced the prediction.
    pub model_id: Uuid,
}

/// A forecast issued by a registered model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Prediction {
    /// Prediction ID.
    pub id: Uuid,
    /// What is forecast.
    pub prediction_type: PredictionType,
    /// Policy forecast, for policy-level predictions.
    pub target_policy_id: Option<Uuid>,
    /// Jurisdiction slice.
    pub target_jurisdiction: JurisdictionCode,
    /// Industry slice.
    pub target_industry: Option<String>,
    /// Months ahead.
    pub horizon_months: u32,
    /// Nominal coverage of the interval.
    pub confidence_level: f64,
    /// Scenario label.
    pub scenario: Scenario,
    /// Registered model ID.
    pub model_id: Uuid,
    /// Model version at issue time.
    pub model_version: String,
    /// Input features the model consumed.
    pub features_used: Vec<String>,
    /// Point forecast at the horizon.
    pub predicted_value: f64,
    /// Event probability, for event models.
    pub predicted_probability: Option<f64>,
    /// Lower interval bound at the horizon.
    pub confidence_interval_lower: f64,
    /// Upper interval bound at the horizon.
    pub confidence_interval_upper: f64,
    /// Per-month path up to the horizon.
    pub trajectory: Vec<ForecastPoint>,
    /// Forecast origin.
    pub prediction_date: DateTime<Utc>,
    /// Date the forecast refers to.
    pub target_date: DateTime<Utc>,
    /// Processing status.
    pub status: PredictionStatus,
    /// Fitted parameters and data summary.
    pub assumptions: BTreeMap<String, f64>,
    /// Prediction this one replaced.
    pub supersedes: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`; predictions are never modified.
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    /// Supersession key.
    pub fn key(&self) -> PredictionKey {
        PredictionKey {
            prediction_type: self.prediction_type,
            target_policy_id: self.target_policy_id,
            target_jurisdiction: self.target_jurisdiction.as_str().to_string(),
            target_industry: self.target_industry.clone(),
            model_id: self.model_id,
        }
    }

    /// Whether `value` lies inside the horizon interval.
    pub fn covers(&self, value: f64) -> bool {
        self.confidence_interval_lower <= value && value <= self.confidence_interval_upper
    }
}

/// A registered forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionModel {
    /// Model ID.
    pub id: Uuid,
    /// Unique model name.
    pub name: String,
    /// Family.
    pub model_type: ModelType,
    /// Semantic version.
    pub version: String,
    /// Algorithm name.
    pub algorithm: String,
    /// What the model does.
    pub description: String,
    /// Tunable parameters.
    pub hyperparameters: BTreeMap<String, f64>,
    /// Features consumed.
    pub training_features: Vec<String>,
    /// How the model is validated.
    pub validation_method: String,
    /// Prediction types the model serves.
    pub serves: Vec<PredictionType>,
    /// Whether new predictions may use this model.
    pub is_active: bool,
    /// When the model was deployed.
    pub deployment_date: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Realised value observed for a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionOutcome {
    /// Outcome ID.
    pub id: Uuid,
    /// Prediction scored.
    pub prediction_id: Uuid,
    /// Observed value.
    pub actual_value: f64,
    /// When it was observed.
    pub observed_at: DateTime<Utc>,
    /// `|actual - predicted|`.
    pub absolute_error: f64,
    /// `absolute_error / |actual|`.
    pub percentage_error: f64,
    /// Whether the actual fell inside the interval.
    pub within_interval: bool,
    /// `max(0, 1 - percentage_error)`.
    pub accuracy_score: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_type_names() {
        for t in PredictionType::ALL {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn model_type_serde() {
        assert_eq!(serde_json::to_string(&ModelType::TimeSeries).unwrap(), "\"time_series\"");
        assert_eq!(serde_json::to_string(&ModelType::DeepLearning).unwrap(), "\"deep_learning\"");
        let parsed: ModelType = serde_json::from_str("\"econometric\"").unwrap();
        assert_eq!(parsed, ModelType::Econometric);
    }

    #[test]
    fn status_serde() {
        let json = serde_json::to_string(&PredictionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
