//! # Prediction API
//!
//! Issues forecasts from the model registry into the prediction book and
//! records realised outcomes against them. Issued predictions are never
//! edited; a newer forecast for the same target supersedes the older one.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use radar_core::{
    JurisdictionCode, Prediction, PredictionModel, PredictionOutcome, PredictionType, Scenario,
};
use radar_forecast::forecaster::DEFAULT_CONFIDENCE;
use radar_forecast::{ForecastContext, ForecastRequest, ModelPerformance};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the predictions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/predictions", get(list_predictions))
        .route("/api/v1/predictions/generate", post(generate_prediction))
        .route("/api/v1/predictions/models", get(list_models))
        .route(
            "/api/v1/predictions/models/:id/performance",
            get(model_performance),
        )
        .route("/api/v1/predictions/:id", get(get_prediction))
        .route("/api/v1/predictions/:id/outcome", post(record_outcome))
}

// ── Types ───────────────────────────────────────────────────────────

/// Filters for `GET /api/v1/predictions`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictionListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub prediction_type: Option<PredictionType>,
    /// Target jurisdiction, case-insensitive.
    pub jurisdiction: Option<String>,
    pub policy_id: Option<Uuid>,
    /// Only predictions not superseded by a newer one (default false).
    #[serde(default)]
    pub current_only: bool,
}

impl Validate for PredictionListQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page).map(|_| ())
    }
}

/// Request to run a model and issue its prediction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GeneratePredictionRequest {
    pub prediction_type: PredictionType,
    /// Target jurisdiction code.
    pub jurisdiction: String,
    /// Industry slice; all industries when absent.
    pub industry: Option<String>,
    /// Required for `timeline_prediction`, optional for `policy_change`.
    pub policy_id: Option<Uuid>,
    /// Months ahead, 1..=120. Defaults to the configured horizon.
    pub horizon_months: Option<u32>,
    /// Interval confidence, in (0, 1). Defaults to 0.8.
    pub confidence_level: Option<f64>,
    /// Scenario label carried on the prediction.
    pub scenario: Option<Scenario>,
}

impl Validate for GeneratePredictionRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(c) = self.confidence_level {
            if !(c > 0.0 && c < 1.0) {
                return Err("confidence_level must be in (0, 1)".to_string());
            }
        }
        if self.prediction_type == PredictionType::TimelinePrediction && self.policy_id.is_none() {
            return Err("policy_id is required for timeline_prediction".to_string());
        }
        Ok(())
    }
}

/// Realised value for an issued prediction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordOutcomeRequest {
    pub actual_value: f64,
    /// When the value was observed. Defaults to now.
    pub observed_at: Option<DateTime<Utc>>,
}

impl Validate for RecordOutcomeRequest {
    fn validate(&self) -> Result<(), String> {
        if !self.actual_value.is_finite() {
            return Err("actual_value must be a finite number".to_string());
        }
        Ok(())
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /api/v1/predictions — List predictions, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/predictions",
    params(PredictionListQuery),
    responses(
        (status = 200, description = "Page of predictions (data)", body = Vec<Prediction>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "predictions"
)]
async fn list_predictions(
    State(state): State<AppState>,
    query: Result<Query<PredictionListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Prediction>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;

    let mut rows: Vec<Prediction> = {
        let book = state.predictions.read();
        book.list()
            .iter()
            .filter(|p| {
                q.prediction_type.map_or(true, |t| p.prediction_type == t)
                    && q
                        .jurisdiction
                        .as_deref()
                        .map_or(true, |j| p.target_jurisdiction.matches(j))
                    && q.policy_id.map_or(true, |id| p.target_policy_id == Some(id))
                    && (!q.current_only || book.is_current(p.id))
            })
            .cloned()
            .collect()
    };
    rows.sort_by(|a, b| b.prediction_date.cmp(&a.prediction_date).then(a.id.cmp(&b.id)));
    Ok(Json(ApiResponse::page(rows, pagination)))
}

/// GET /api/v1/predictions/:id — Get a prediction.
#[utoipa::path(
    get,
    path = "/api/v1/predictions/{id}",
    params(("id" = Uuid, Path, description = "Prediction ID")),
    responses(
        (status = 200, description = "Prediction found (data)", body = Prediction),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "predictions"
)]
async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Prediction>>, AppError> {
    state
        .predictions
        .read()
        .get(id)
        .cloned()
        .map(|p| Json(ApiResponse::ok(p)))
        .ok_or_else(|| AppError::NotFound(format!("prediction {id} not found")))
}

/// POST /api/v1/predictions/generate — Run a model and issue the result.
#[utoipa::path(
    post,
    path = "/api/v1/predictions/generate",
    request_body = GeneratePredictionRequest,
    responses(
        (status = 201, description = "Prediction issued (data)", body = Prediction),
        (status = 404, description = "Target policy not found", body = crate::error::ErrorBody),
        (
            status = 409,
            description = "Target policy already enacted",
            body = crate::error::ErrorBody
        ),
        (
            status = 422,
            description = "Invalid request or insufficient history",
            body = crate::error::ErrorBody
        ),
    ),
    tag = "predictions"
)]
async fn generate_prediction(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GeneratePredictionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Prediction>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let mut request = ForecastRequest::new(
        req.prediction_type,
        JurisdictionCode::new(&req.jurisdiction)?,
        now,
    )
    .with_horizon(
        req.horizon_months
            .unwrap_or(state.config.prediction_horizon_months),
    )
    .with_confidence(req.confidence_level.unwrap_or(DEFAULT_CONFIDENCE));
    if let Some(industry) = &req.industry {
        request = request.with_industry(industry.to_ascii_lowercase());
    }
    if let Some(policy_id) = req.policy_id {
        request = request.with_policy(policy_id);
    }
    if let Some(scenario) = req.scenario {
        request.scenario = scenario;
    }

    let policies = state.policies.list();
    let changes = state.policy_changes.list();
    let forecaster = state.forecaster.clone();
    let prediction = tokio::task::spawn_blocking(move || {
        let ctx = ForecastContext {
            policies: &policies,
            changes: &changes,
        };
        forecaster.run(&request, ctx, Uuid::new_v4())
    })
    .await
    .map_err(|e| AppError::Internal(format!("forecast worker failed: {e}")))??;

    let issued = state.predictions.write().issue(prediction)?.clone();
    state.persist(&issued).await?;
    state.invalidate_caches();

    tracing::info!(
        prediction_id = %issued.id,
        prediction_type = issued.prediction_type.as_str(),
        supersedes = ?issued.supersedes,
        "Prediction issued"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(issued))))
}

/// POST /api/v1/predictions/:id/outcome — Record the realised value.
#[utoipa::path(
    post,
    path = "/api/v1/predictions/{id}/outcome",
    params(("id" = Uuid, Path, description = "Prediction ID")),
    request_body = RecordOutcomeRequest,
    responses(
        (status = 201, description = "Outcome scored (data)", body = PredictionOutcome),
        (status = 404, description = "Prediction not found", body = crate::error::ErrorBody),
        (status = 409, description = "Outcome already recorded", body = crate::error::ErrorBody),
    ),
    tag = "predictions"
)]
async fn record_outcome(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<RecordOutcomeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PredictionOutcome>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let outcome = state
        .predictions
        .write()
        .record_outcome(
            id,
            req.actual_value,
            req.observed_at.unwrap_or(now),
            Uuid::new_v4(),
            now,
        )?
        .clone();
    state.persist(&outcome).await?;
    state.invalidate_caches();

    tracing::info!(
        prediction_id = %id,
        within_interval = outcome.within_interval,
        accuracy = outcome.accuracy_score,
        "Prediction outcome recorded"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome))))
}

/// GET /api/v1/predictions/models — Registered models.
#[utoipa::path(
    get,
    path = "/api/v1/predictions/models",
    responses((status = 200, description = "Model registry (data)", body = Vec<PredictionModel>)),
    tag = "predictions"
)]
async fn list_models(State(state): State<AppState>) -> Json<ApiResponse<Vec<PredictionModel>>> {
    let models = state
        .forecaster
        .registry()
        .list()
        .into_iter()
        .cloned()
        .collect();
    Json(ApiResponse::ok(models))
}

/// GET /api/v1/predictions/models/:id/performance — Accuracy tracking.
#[utoipa::path(
    get,
    path = "/api/v1/predictions/models/{id}/performance",
    params(("id" = Uuid, Path, description = "Model ID")),
    responses(
        (
            status = 200,
            description = "Hit rate and error statistics (data)",
            body = ModelPerformance
        ),
        (status = 404, description = "Model not found", body = crate::error::ErrorBody),
    ),
    tag = "predictions"
)]
async fn model_performance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ModelPerformance>>, AppError> {
    state.forecaster.registry().get(id)?;
    let performance = state.predictions.read().performance(id);
    Ok(Json(ApiResponse::ok(performance)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(prediction_type: PredictionType) -> GeneratePredictionRequest {
        GeneratePredictionRequest {
            prediction_type,
            jurisdiction: "US".into(),
            industry: None,
            policy_id: None,
            horizon_months: None,
            confidence_level: None,
            scenario: None,
        }
    }

    #[test]
    fn timeline_needs_policy() {
        assert!(generate(PredictionType::TimelinePrediction).validate().is_err());
        assert!(generate(PredictionType::ImpactForecast).validate().is_ok());
    }

    #[test]
    fn confidence_bounds() {
        let mut req = generate(PredictionType::RiskAssessment);
        req.confidence_level = Some(1.0);
        assert!(req.validate().is_err());
        req.confidence_level = Some(0.95);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn outcome_must_be_finite() {
        let req = RecordOutcomeRequest {
            actual_value: f64::NAN,
            observed_at: None,
        };
        assert!(req.validate().is_err());
    }
}
