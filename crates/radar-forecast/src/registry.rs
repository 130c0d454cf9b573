//! # Model Registry
//!
//! Holds the forecasting models that may issue predictions. The three
//! built-in models have fixed IDs so predictions reference the same model
//! across restarts and databases.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use radar_core::{ModelType, PredictionModel, PredictionType};
use uuid::Uuid;

use crate::error::ForecastError;

/// ID of the Holt smoothing model.
pub const HOLT_MODEL_ID: Uuid = Uuid::from_u128(0x7c1e_0d4a_5b2f_4e11_9a3c_0000_0000_0001);
/// ID of the Poisson change-hazard model.
pub const HAZARD_MODEL_ID: Uuid = Uuid::from_u128(0x7c1e_0d4a_5b2f_4e11_9a3c_0000_0000_0002);
/// ID of the empirical enactment-timeline model.
pub const TIMELINE_MODEL_ID: Uuid = Uuid::from_u128(0x7c1e_0d4a_5b2f_4e11_9a3c_0000_0000_0003);

/// Registered models keyed by ID.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<Uuid, PredictionModel>,
}

fn deployed() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn params(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn features(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl ModelRegistry {
    /// Registry with no models.
    pub fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in models.
    pub fn seeded() -> Self {
        let at = deployed();
        let mut registry = Self::empty();
        registry.insert(PredictionModel {
            id: HOLT_MODEL_ID,
            name: "holt-linear-impact".to_string(),
            model_type: ModelType::TimeSeries,
            version: "1.0.0".to_string(),
            algorithm: "holt_linear_exponential_smoothing".to_string(),
            description: "Level and trend smoothing over monthly policy impact and high-risk \
                          share, grid-searched on one-step error"
                .to_string(),
            hyperparameters: params(&[("alpha_min", 0.1), ("alpha_max", 0.9), ("min_points", 3.0)]),
            training_features: features(&[
                "estimated_impact",
                "impact_confidence",
                "proposed_date",
            ]),
            validation_method: "rolling_origin_backtest".to_string(),
            serves: vec![PredictionType::ImpactForecast, PredictionType::RiskAssessment],
            is_active: true,
            deployment_date: at,
            created_at: at,
            updated_at: at,
        });
        registry.insert(PredictionModel {
            id: HAZARD_MODEL_ID,
            name: "poisson-change-hazard".to_string(),
            model_type: ModelType::Econometric,
            version: "1.0.0".to_string(),
            algorithm: "shrunk_poisson_rate".to_string(),
            description: "Monthly amendment and repeal rate with a half-event prior over six months"
                .to_string(),
            hyperparameters: params(&[("prior_events", 0.5), ("prior_months", 6.0)]),
            training_features: features(&["change_date", "proposed_date"]),
            validation_method: "outcome_tracking".to_string(),
            serves: vec![PredictionType::PolicyChange],
            is_active: true,
            deployment_date: at,
            created_at: at,
            updated_at: at,
        });
        registry.insert(PredictionModel {
            id: TIMELINE_MODEL_ID,
            name: "empirical-enactment-timeline".to_string(),
            model_type: ModelType::Regression,
            version: "1.0.0".to_string(),
            algorithm: "empirical_quantiles".to_string(),
            description: "Median and quantile interval of months from proposal to enactment"
                .to_string(),
            hyperparameters: params(&[("min_samples", 3.0)]),
            training_features: features(&["proposed_date", "enacted_date", "jurisdiction"]),
            validation_method: "outcome_tracking".to_string(),
            serves: vec![PredictionType::TimelinePrediction],
            is_active: true,
            deployment_date: at,
            created_at: at,
            updated_at: at,
        });
        registry
    }

    /// Add or replace a model.
    pub fn insert(&mut self, model: PredictionModel) {
        self.models.insert(model.id, model);
    }

    /// Look up by ID.
    pub fn get(&self, id: Uuid) -> Result<&PredictionModel, ForecastError> {
        self.models.get(&id).ok_or(ForecastError::ModelNotFound(id))
    }

    /// Look up by unique name.
    pub fn by_name(&self, name: &str) -> Option<&PredictionModel> {
        self.models.values().find(|m| m.name == name)
    }

    /// The active model serving `prediction_type`.
    pub fn for_type(
        &self,
        prediction_type: PredictionType,
    ) -> Result<&PredictionModel, ForecastError> {
        self.models
            .values()
            .find(|m| m.is_active && m.serves.contains(&prediction_type))
            .ok_or(ForecastError::NoModel(prediction_type))
    }

    /// Every model, ordered by ID.
    pub fn list(&self) -> Vec<&PredictionModel> {
        self.models.values().collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}
