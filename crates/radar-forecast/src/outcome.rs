//! # Outcome Scoring
//!
//! Compares realised values with issued predictions and aggregates the
//! results per model.

use chrono::{DateTime, Utc};
use radar_core::{Prediction, PredictionOutcome};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ForecastError;
use crate::stats::mean;

const PERCENTAGE_FLOOR: f64 = 1e-9;

/// Score `actual` against `prediction`.
pub fn score_outcome(
    prediction: &Prediction,
    actual: f64,
    observed_at: DateTime<Utc>,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<PredictionOutcome, ForecastError> {
    if !actual.is_finite() {
        return Err(ForecastError::NotFinite("actual_value"));
    }
    let absolute_error = (actual - prediction.predicted_value).abs();
    let percentage_error = absolute_error / actual.abs().max(PERCENTAGE_FLOOR);
    Ok(PredictionOutcome {
        id,
        prediction_id: prediction.id,
        actual_value: actual,
        observed_at,
        absolute_error,
        percentage_error,
        within_interval: prediction.covers(actual),
        accuracy_score: (1.0 - percentage_error).max(0.0),
        created_at: now,
    })
}

/// Accuracy tracking for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelPerformance {
    /// Model scored.
    pub model_id: Uuid,
    /// Predictions issued by the model.
    pub predictions: usize,
    /// Outcomes recorded against them.
    pub outcomes: usize,
    /// Share of outcomes inside the interval.
    pub hit_rate: Option<f64>,
    /// Mean accuracy score.
    pub mean_accuracy: Option<f64>,
    /// Mean absolute percentage error.
    pub mape: Option<f64>,
}

impl ModelPerformance {
    /// Aggregate scored outcomes.
    pub fn from_outcomes(
        model_id: Uuid,
        predictions: usize,
        outcomes: &[&PredictionOutcome],
    ) -> Self {
        let hits: Vec<f64> = outcomes
            .iter()
            .map(|o| if o.within_interval { 1.0 } else { 0.0 })
            .collect();
        let accuracy: Vec<f64> = outcomes.iter().map(|o| o.accuracy_score).collect();
        let pct: Vec<f64> = outcomes.iter().map(|o| o.percentage_error).collect();
        Self {
            model_id,
            predictions,
            outcomes: outcomes.len(),
            hit_rate: mean(&hits),
            mean_accuracy: mean(&accuracy),
            mape: mean(&pct),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use radar_core::{JurisdictionCode, PredictionStatus, PredictionType, Scenario};
    use std::collections::BTreeMap;

    pub(crate) fn prediction(value: f64, lower: f64, upper: f64) -> Prediction {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Prediction {
            id: Uuid::new_v4(),
            prediction_type: PredictionType::ImpactForecast,
            target_policy_id: None,
            target_jurisdiction: JurisdictionCode::new("US").unwrap(),
            target_industry: None,
            horizon_months: 6,
            confidence_level: 0.8,
            scenario: Scenario::Baseline,
            model_id: crate::registry::HOLT_MODEL_ID,
            model_version: "1.0.0".to_string(),
            features_used: vec![],
            predicted_value: value,
            predicted_probability: None,
            confidence_interval_lower: lower,
            confidence_interval_upper: upper,
            trajectory: vec![],
            prediction_date: at,
            target_date: at,
            status: PredictionStatus::Completed,
            assumptions: BTreeMap::new(),
            supersedes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn scores_hit() {
        let p = prediction(100.0, 80.0, 120.0);
        let now = Utc::now();
        let o = score_outcome(&p, 110.0, now, Uuid::new_v4(), now).unwrap();
        assert!((o.absolute_error - 10.0).abs() < 1e-12);
        assert!((o.percentage_error - 10.0 / 110.0).abs() < 1e-12);
        assert!(o.within_interval);
        assert!((o.accuracy_score - (1.0 - 10.0 / 110.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_actual_uses_floor() {
        let p = prediction(5.0, 4.0, 6.0);
        let now = Utc::now();
        let o = score_outcome(&p, 0.0, now, Uuid::new_v4(), now).unwrap();
        assert!(!o.within_interval);
        assert_eq!(o.accuracy_score, 0.0);
        assert!(o.percentage_error.is_finite());
    }

    #[test]
    fn non_finite_actual_rejected() {
        let p = prediction(5.0, 4.0, 6.0);
        let now = Utc::now();
        assert!(score_outcome(&p, f64::INFINITY, now, Uuid::new_v4(), now).is_err());
    }

    #[test]
    fn performance_aggregates() {
        let p = prediction(100.0, 90.0, 110.0);
        let now = Utc::now();
        let a = score_outcome(&p, 100.0, now, Uuid::new_v4(), now).unwrap();
        let b = score_outcome(&p, 200.0, now, Uuid::new_v4(), now).unwrap();
        let perf = ModelPerformance::from_outcomes(p.model_id, 3, &[&a, &b]);
        assert_eq!(perf.outcomes, 2);
        assert_eq!(perf.hit_rate, Some(0.5));
        assert!((perf.mape.unwrap() - 0.25).abs() < 1e-12);
        assert!((perf.mean_accuracy.unwrap() - 0.75).abs() < 1e-12);

        let empty = ModelPerformance::from_outcomes(p.model_id, 0, &[]);
        assert_eq!(empty.hit_rate, None);
    }
}
