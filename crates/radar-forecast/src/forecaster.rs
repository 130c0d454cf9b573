//! # Forecaster
//!
//! Dispatches a [`ForecastRequest`] to the model registered for its
//! prediction type and assembles the resulting [`Prediction`]. Only history
//! dated on or before `as_of` is used, so a forecast can be replayed for
//! any past origin.
//!
//! Smoothing series run through the last complete month before `as_of`;
//! a partially elapsed month would otherwise read as a drop to zero.
//!
//! The forecaster does not read the clock or generate IDs; callers pass
//! both. Issuing (supersession, storage) is the [`PredictionBook`]'s job.
//!
//! [`PredictionBook`]: crate::book::PredictionBook

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, Utc};
use radar_core::{
    ForecastPoint, JurisdictionCode, Policy, PolicyChange, Prediction, PredictionModel,
    PredictionStatus, PredictionType, Scenario,
};
use uuid::Uuid;

use crate::error::ForecastError;
use crate::hazard::HazardEstimate;
use crate::holt::{clamp_trajectory, HoltFit};
use crate::registry::ModelRegistry;
use crate::series::{monthly_series, SeriesKind};
use crate::stats::{z_for_confidence, DAYS_PER_MONTH};
use crate::timeline::TimelineEstimate;

/// Longest supported horizon in months.
pub const MAX_HORIZON_MONTHS: u32 = 120;

/// Default nominal interval level.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Default horizon in months.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// What to forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    /// Prediction type; selects the model.
    pub prediction_type: PredictionType,
    /// Jurisdiction slice.
    pub jurisdiction: JurisdictionCode,
    /// Optional industry slice.
    pub industry: Option<String>,
    /// Optional target policy.
    pub policy_id: Option<Uuid>,
    /// Months ahead, `1..=120`.
    pub horizon_months: u32,
    /// Nominal interval level in `(0, 1)`.
    pub confidence_level: f64,
    /// Scenario label carried onto the prediction.
    pub scenario: Scenario,
    /// Forecast origin.
    pub as_of: DateTime<Utc>,
}

impl ForecastRequest {
    /// Request with the default horizon and confidence.
    pub fn new(
        prediction_type: PredictionType,
        jurisdiction: JurisdictionCode,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            prediction_type,
            jurisdiction,
            industry: None,
            policy_id: None,
            horizon_months: DEFAULT_HORIZON_MONTHS,
            confidence_level: DEFAULT_CONFIDENCE,
            scenario: Scenario::Baseline,
            as_of,
        }
    }

    /// Set the horizon.
    pub fn with_horizon(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    /// Set the industry slice.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Set the target policy.
    pub fn with_policy(mut self, policy_id: Uuid) -> Self {
        self.policy_id = Some(policy_id);
        self
    }

    /// Set the confidence level.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_level = confidence;
        self
    }

    fn validate(&self) -> Result<f64, ForecastError> {
        if !(1..=MAX_HORIZON_MONTHS).contains(&self.horizon_months) {
            return Err(ForecastError::InvalidHorizon(self.horizon_months));
        }
        z_for_confidence(self.confidence_level)
    }
}

/// Historical records the models read.
#[derive(Debug, Clone, Copy)]
pub struct ForecastContext<'a> {
    /// Every known policy.
    pub policies: &'a [Policy],
    /// Every recorded policy change.
    pub changes: &'a [PolicyChange],
}

/// Model output before it is wrapped into a [`Prediction`].
struct ModelRun {
    trajectory: Vec<ForecastPoint>,
    headline: ForecastPoint,
    probability: Option<f64>,
    target_date: DateTime<Utc>,
    features: Vec<&'static str>,
    assumptions: BTreeMap<String, f64>,
}

/// Runs registered models.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    registry: ModelRegistry,
}

impl Forecaster {
    /// Forecaster over `registry`.
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Registered models.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Produce a prediction with ID `id`. The result is not yet issued.
    pub fn run(
        &self,
        request: &ForecastRequest,
        ctx: ForecastContext<'_>,
        id: Uuid,
    ) -> Result<Prediction, ForecastError> {
        let z = request.validate()?;
        let model = self.registry.for_type(request.prediction_type)?;

        let target = match request.policy_id {
            Some(pid) => Some(
                ctx.policies
                    .iter()
                    .find(|p| p.id == pid)
                    .ok_or(ForecastError::PolicyNotFound(pid))?,
            ),
            None => None,
        };
        let history: Vec<Policy> = ctx
            .policies
            .iter()
            .filter(|p| p.reference_date() <= request.as_of)
            .cloned()
            .collect();

        let run = match request.prediction_type {
            PredictionType::ImpactForecast => {
                self.smoothing(request, &history, SeriesKind::Impact, z)?
            }
            PredictionType::RiskAssessment => {
                self.smoothing(request, &history, SeriesKind::Risk, z)?
            }
            PredictionType::PolicyChange => self.hazard(request, ctx, &history, target, z)?,
            PredictionType::TimelinePrediction => self.timeline(request, &history, target)?,
        };

        let prediction = assemble(request, model, run, id);
        tracing::info!(
            prediction_id = %prediction.id,
            prediction_type = prediction.prediction_type.as_str(),
            jurisdiction = prediction.target_jurisdiction.as_str(),
            model = model.name.as_str(),
            predicted_value = prediction.predicted_value,
            "forecast produced"
        );
        Ok(prediction)
    }

    fn smoothing(
        &self,
        request: &ForecastRequest,
        history: &[Policy],
        kind: SeriesKind,
        z: f64,
    ) -> Result<ModelRun, ForecastError> {
        let series = monthly_series(
            history,
            request.jurisdiction.as_str(),
            request.industry.as_deref(),
            kind,
            request.as_of.checked_sub_months(Months::new(1)),
        );
        let fit = HoltFit::fit(&series.values)?;
        let mut trajectory = fit.trajectory(request.horizon_months, z);
        if kind == SeriesKind::Risk {
            clamp_trajectory(&mut trajectory, 0.0, 1.0);
        }
        let headline = last_point(&trajectory, request.horizon_months);

        let mut assumptions = BTreeMap::new();
        assumptions.insert("alpha".to_string(), fit.alpha);
        assumptions.insert("beta".to_string(), fit.beta);
        assumptions.insert("level".to_string(), fit.level);
        assumptions.insert("trend".to_string(), fit.trend);
        assumptions.insert("sigma".to_string(), fit.sigma);
        assumptions.insert("observations".to_string(), fit.n as f64);
        assumptions.insert("z".to_string(), z);

        let features = match kind {
            SeriesKind::Risk => vec![
                "monthly_high_risk_share",
                "estimated_impact",
                "impact_confidence",
            ],
            _ => vec!["monthly_estimated_impact_sum", "proposed_date"],
        };
        Ok(ModelRun {
            probability: (kind == SeriesKind::Risk).then_some(headline.value),
            headline,
            trajectory,
            target_date: months_after(request.as_of, request.horizon_months)?,
            features,
            assumptions,
        })
    }

    fn hazard(
        &self,
        request: &ForecastRequest,
        ctx: ForecastContext<'_>,
        history: &[Policy],
        target: Option<&Policy>,
        z: f64,
    ) -> Result<ModelRun, ForecastError> {
        let observe = |policy: &Policy| {
            HazardEstimate::observe(
                ctx.changes
                    .iter()
                    .filter(|c| c.policy_id == policy.id)
                    .map(|c| c.change_date),
                policy.reference_date(),
                request.as_of,
            )
        };
        let (estimate, pooled_policies) = match target {
            Some(policy) => (observe(policy), 1usize),
            None => history
                .iter()
                .filter(|p| p.jurisdiction.matches(request.jurisdiction.as_str()))
                .filter(|p| {
                    request
                        .industry
                        .as_deref()
                        .map_or(true, |i| p.affects_industry(i))
                })
                .fold((HazardEstimate::empty(), 0usize), |(acc, n), p| {
                    (acc.pool(observe(p)), n + 1)
                }),
        };
        let trajectory = estimate.trajectory(request.horizon_months, z);
        let headline = last_point(&trajectory, request.horizon_months);

        let mut assumptions = BTreeMap::new();
        assumptions.insert("rate_per_month".to_string(), estimate.rate());
        assumptions.insert("changes_observed".to_string(), estimate.changes as f64);
        assumptions.insert("exposure_months".to_string(), estimate.exposure_months);
        assumptions.insert("policies_pooled".to_string(), pooled_policies as f64);
        assumptions.insert("z".to_string(), z);

        Ok(ModelRun {
            probability: Some(estimate.probability_within(request.horizon_months)),
            headline,
            trajectory,
            target_date: months_after(request.as_of, request.horizon_months)?,
            features: vec!["change_date", "change_type", "proposed_date"],
            assumptions,
        })
    }

    fn timeline(
        &self,
        request: &ForecastRequest,
        history: &[Policy],
        target: Option<&Policy>,
    ) -> Result<ModelRun, ForecastError> {
        if let Some(policy) = target {
            // The status is current, not as of the origin; only trust it when
            // no enactment date says otherwise.
            let enacted = match policy.enacted_date {
                Some(at) => at <= request.as_of,
                None => policy.status.is_in_force(),
            };
            if enacted {
                return Err(ForecastError::AlreadyEnacted(policy.id));
            }
        }
        let estimate = TimelineEstimate::estimate(
            history,
            request.jurisdiction.as_str(),
            request.confidence_level,
            request.as_of,
        )?;
        let origin = target.map_or(request.as_of, Policy::reference_date);
        let headline = ForecastPoint {
            period: estimate.median.ceil().max(1.0) as u32,
            value: estimate.median,
            lower: estimate.lower,
            upper: estimate.upper,
        };

        let mut assumptions = BTreeMap::new();
        assumptions.insert("median_months".to_string(), estimate.median);
        assumptions.insert("samples".to_string(), estimate.samples as f64);
        assumptions.insert("pooled".to_string(), if estimate.pooled { 1.0 } else { 0.0 });

        let seconds = (estimate.median * DAYS_PER_MONTH * 86_400.0).round() as i64;
        Ok(ModelRun {
            probability: None,
            trajectory: vec![headline],
            headline,
            target_date: origin + Duration::seconds(seconds),
            features: vec!["proposed_date", "enacted_date", "jurisdiction"],
            assumptions,
        })
    }
}

fn last_point(trajectory: &[ForecastPoint], horizon: u32) -> ForecastPoint {
    trajectory.last().copied().unwrap_or(ForecastPoint {
        period: horizon,
        value: 0.0,
        lower: 0.0,
        upper: 0.0,
    })
}

fn months_after(at: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ForecastError> {
    at.checked_add_months(Months::new(months))
        .ok_or(ForecastError::InvalidHorizon(months))
}

fn assemble(
    request: &ForecastRequest,
    model: &PredictionModel,
    run: ModelRun,
    id: Uuid,
) -> Prediction {
    Prediction {
        id,
        prediction_type: request.prediction_type,
        target_policy_id: request.policy_id,
        target_jurisdiction: request.jurisdiction.clone(),
        target_industry: request.industry.clone(),
        horizon_months: request.horizon_months,
        confidence_level: request.confidence_level,
        scenario: request.scenario,
        model_id: model.id,
        model_version: model.version.clone(),
        features_used: run.features.into_iter().map(str::to_string).collect(),
        predicted_value: run.headline.value,
        predicted_probability: run.probability,
        confidence_interval_lower: run.headline.lower,
        confidence_interval_upper: run.headline.upper,
        trajectory: run.trajectory,
        prediction_date: request.as_of,
        target_date: run.target_date,
        status: PredictionStatus::Completed,
        assumptions: run.assumptions,
        supersedes: None,
        created_at: request.as_of,
        updated_at: request.as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HAZARD_MODEL_ID, HOLT_MODEL_ID, TIMELINE_MODEL_ID};
    use crate::series::tests::policy_at;
    use chrono::TimeZone;
    use radar_core::{ChangeType, PolicyStatus};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn us() -> JurisdictionCode {
        JurisdictionCode::new("US").unwrap()
    }

    fn history() -> Vec<Policy> {
        (1..=12)
            .map(|m| policy_at("US", 2024, m, -10.0 * m as f64))
            .collect()
    }

    fn change(policy: &Policy, y: i32, m: u32) -> PolicyChange {
        let at = Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).unwrap();
        PolicyChange {
            id: Uuid::new_v4(),
            policy_id: policy.id,
            change_type: ChangeType::Amendment,
            change_date: at,
            change_description: None,
            impact_magnitude: None,
            impact_direction: None,
            source_document: None,
            legislative_session: None,
            created_at: at,
        }
    }

    #[test]
    fn impact_forecast_follows_trend() {
        let policies = history();
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req =
            ForecastRequest::new(PredictionType::ImpactForecast, us(), as_of()).with_horizon(6);
        let p = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        assert_eq!(p.model_id, HOLT_MODEL_ID);
        assert_eq!(p.trajectory.len(), 6);
        assert!(p.predicted_value < -120.0);
        assert!(p.confidence_interval_lower <= p.predicted_value);
        assert!(p.predicted_value <= p.confidence_interval_upper);
        assert_eq!(p.target_date, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(p.status, PredictionStatus::Completed);
        assert!(p.assumptions.contains_key("alpha"));
    }

    #[test]
    fn future_policies_are_ignored() {
        let mut policies = history();
        policies.push(policy_at("US", 2026, 6, -99_999.0));
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req =
            ForecastRequest::new(PredictionType::ImpactForecast, us(), as_of()).with_horizon(1);
        let with_future = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        let base = history();
        let ctx = ForecastContext { policies: &base, changes: &[] };
        let without = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        assert_eq!(with_future.predicted_value, without.predicted_value);
    }

    #[test]
    fn risk_forecast_is_clamped() {
        let policies: Vec<Policy> = (1..=8)
            .map(|m| policy_at("US", 2024, m, if m > 4 { -500.0 } else { 10.0 }))
            .collect();
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req = ForecastRequest::new(PredictionType::RiskAssessment, us(), as_of());
        let p = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        for point in &p.trajectory {
            assert!((0.0..=1.0).contains(&point.lower));
            assert!((0.0..=1.0).contains(&point.upper));
        }
        assert_eq!(p.predicted_probability, Some(p.predicted_value));
    }

    #[test]
    fn insufficient_history_reported() {
        let policies = vec![policy_at("US", 2024, 12, -1.0)];
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req = ForecastRequest::new(PredictionType::ImpactForecast, us(), as_of());
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn change_hazard_for_one_policy() {
        let policies = history();
        let target = &policies[0];
        let changes = vec![change(target, 2024, 5), change(target, 2024, 9)];
        let ctx = ForecastContext { policies: &policies, changes: &changes };
        let req = ForecastRequest::new(PredictionType::PolicyChange, us(), as_of())
            .with_horizon(6)
            .with_policy(target.id);
        let p = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        assert_eq!(p.model_id, HAZARD_MODEL_ID);
        assert_eq!(p.assumptions["changes_observed"], 2.0);
        let prob = p.predicted_probability.unwrap();
        assert!(prob > 0.0 && prob < 1.0);
        assert!(p.confidence_interval_lower >= 0.0);
    }

    #[test]
    fn change_hazard_pools_jurisdiction() {
        let policies = history();
        let changes = vec![change(&policies[0], 2024, 5), change(&policies[3], 2024, 8)];
        let ctx = ForecastContext { policies: &policies, changes: &changes };
        let req = ForecastRequest::new(PredictionType::PolicyChange, us(), as_of());
        let p = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        assert_eq!(p.assumptions["policies_pooled"], 12.0);
        assert_eq!(p.assumptions["changes_observed"], 2.0);
        assert!(p.target_policy_id.is_none());
    }

    #[test]
    fn timeline_rejects_enacted_target() {
        let mut policies = history();
        for p in policies.iter_mut().take(4) {
            p.enacted_date = p.proposed_date.map(|d| d + Duration::days(120));
            p.status = PolicyStatus::Enacted;
        }
        let enacted = policies[0].id;
        let pending = policies[6].id;
        let ctx = ForecastContext { policies: &policies, changes: &[] };

        let req = ForecastRequest::new(PredictionType::TimelinePrediction, us(), as_of())
            .with_policy(enacted);
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::AlreadyEnacted(_))
        ));

        let req = ForecastRequest::new(PredictionType::TimelinePrediction, us(), as_of())
            .with_policy(pending);
        let p = Forecaster::default().run(&req, ctx, Uuid::new_v4()).unwrap();
        assert_eq!(p.model_id, TIMELINE_MODEL_ID);
        assert!((p.predicted_value - 120.0 / DAYS_PER_MONTH).abs() < 1e-6);
        let proposed = policies[6].proposed_date.unwrap();
        assert_eq!((p.target_date - proposed).num_days(), 120);
    }

    #[test]
    fn timeline_replays_from_origin() {
        let mut policies: Vec<Policy> = (1..=4).map(|m| policy_at("US", 2024, m, -5.0)).collect();
        for p in policies.iter_mut() {
            p.enacted_date = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).single();
            p.status = PolicyStatus::Enacted;
        }
        let target = policies[3].id;
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req = ForecastRequest::new(PredictionType::TimelinePrediction, us(), as_of())
            .with_policy(target);
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::InsufficientHistory { .. })
        ));
    }

    #[test]
    fn unknown_policy_and_bad_horizon() {
        let policies = history();
        let ctx = ForecastContext { policies: &policies, changes: &[] };
        let req = ForecastRequest::new(PredictionType::PolicyChange, us(), as_of())
            .with_policy(Uuid::new_v4());
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::PolicyNotFound(_))
        ));
        let req =
            ForecastRequest::new(PredictionType::ImpactForecast, us(), as_of()).with_horizon(0);
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::InvalidHorizon(0))
        ));
        let req = ForecastRequest::new(PredictionType::ImpactForecast, us(), as_of())
            .with_horizon(121);
        assert!(matches!(
            Forecaster::default().run(&req, ctx, Uuid::new_v4()),
            Err(ForecastError::InvalidHorizon(121))
        ));
    }
}
