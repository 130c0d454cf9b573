//! # Impact Assessment API
//!
//! Read access to the assessment ledger plus the two write paths that run
//! the engine: a single (policy, company) pair and a whole policy across
//! the companies it reaches. Only baseline assessments are stored.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use radar_core::{AssessmentPeriod, ImpactAssessment, RiskLevel};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::assessments::{self, BatchSummary, RecordedAssessment};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the impacts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/impacts", get(list_impacts))
        .route("/api/v1/impacts/assess", post(assess))
        .route("/api/v1/impacts/assess-policy", post(assess_policy))
        .route("/api/v1/impacts/:id", get(get_impact))
        .route("/api/v1/impacts/:id/history", get(impact_history))
}

// ── Types ───────────────────────────────────────────────────────────

/// Filters for `GET /api/v1/impacts`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImpactListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub policy_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub risk_level: Option<RiskLevel>,
    /// Evaluation period, `YYYY-YYYY`.
    pub period: Option<String>,
    /// Include superseded records (default false).
    #[serde(default)]
    pub include_superseded: bool,
}

impl Validate for ImpactListQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page)?;
        if let Some(period) = &self.period {
            AssessmentPeriod::new(period).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// Request to assess one (policy, company) pair.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssessRequest {
    pub policy_id: Uuid,
    pub company_id: Uuid,
    /// Evaluation period, `YYYY-YYYY`. Defaults to the current year.
    pub period: Option<String>,
}

impl Validate for AssessRequest {
    fn validate(&self) -> Result<(), String> {
        check_period(self.period.as_deref())
    }
}

/// Request to assess a policy across every company it reaches.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssessPolicyRequest {
    pub policy_id: Uuid,
    /// Evaluation period, `YYYY-YYYY`. Defaults to the current year.
    pub period: Option<String>,
}

impl Validate for AssessPolicyRequest {
    fn validate(&self) -> Result<(), String> {
        check_period(self.period.as_deref())
    }
}

fn check_period(period: Option<&str>) -> Result<(), String> {
    match period {
        Some(p) => AssessmentPeriod::new(p).map(|_| ()).map_err(|e| e.to_string()),
        None => Ok(()),
    }
}

fn resolve_period(period: Option<&str>) -> Result<AssessmentPeriod, AppError> {
    match period {
        Some(p) => Ok(AssessmentPeriod::new(p)?),
        None => Ok(AssessmentPeriod::current(Utc::now())),
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("impact assessment {id} not found"))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /api/v1/impacts — List assessments, most severe first.
#[utoipa::path(
    get,
    path = "/api/v1/impacts",
    params(ImpactListQuery),
    responses(
        (status = 200, description = "Page of assessments (data)", body = Vec<ImpactAssessment>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "impacts"
)]
async fn list_impacts(
    State(state): State<AppState>,
    query: Result<Query<ImpactListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ImpactAssessment>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let period = q.period.as_deref().map(AssessmentPeriod::new).transpose()?;

    let mut rows: Vec<ImpactAssessment> = state
        .ledger
        .read()
        .iter()
        .filter(|a| {
            (q.include_superseded || a.is_active())
                && q.policy_id.map_or(true, |id| a.policy_id == id)
                && q.company_id.map_or(true, |id| a.company_id == id)
                && q.risk_level.map_or(true, |l| a.risk_level == l)
                && period.as_ref().map_or(true, |p| &a.assessment_period == p)
        })
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| b.assessment_date.cmp(&a.assessment_date))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(Json(ApiResponse::page(rows, pagination)))
}

/// GET /api/v1/impacts/:id — Get an assessment.
#[utoipa::path(
    get,
    path = "/api/v1/impacts/{id}",
    params(("id" = Uuid, Path, description = "Assessment ID")),
    responses(
        (status = 200, description = "Assessment found (data)", body = ImpactAssessment),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "impacts"
)]
async fn get_impact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ImpactAssessment>>, AppError> {
    let ledger = state.ledger.read();
    let assessment = ledger.get(&id).cloned().ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::ok(assessment)))
}

/// GET /api/v1/impacts/:id/history — Every assessment for the same
/// (policy, company, period), oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/impacts/{id}/history",
    params(("id" = Uuid, Path, description = "Assessment ID")),
    responses(
        (status = 200, description = "Supersession history (data)", body = Vec<ImpactAssessment>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "impacts"
)]
async fn impact_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ImpactAssessment>>>, AppError> {
    let ledger = state.ledger.read();
    let key = ledger.get(&id).map(ImpactAssessment::key).ok_or_else(|| not_found(id))?;
    let history: Vec<ImpactAssessment> = ledger.history(&key).into_iter().cloned().collect();
    Ok(Json(ApiResponse::ok(history)))
}

/// POST /api/v1/impacts/assess — Assess one pair and record the result.
#[utoipa::path(
    post,
    path = "/api/v1/impacts/assess",
    request_body = AssessRequest,
    responses(
        (
            status = 201,
            description = "New or superseding assessment recorded (data)",
            body = RecordedAssessment
        ),
        (
            status = 200,
            description = "Inputs unchanged; active assessment returned (data)",
            body = RecordedAssessment
        ),
        (status = 404, description = "Policy or company not found", body = crate::error::ErrorBody),
        (
            status = 422,
            description = "Inputs insufficient for assessment",
            body = crate::error::ErrorBody
        ),
    ),
    tag = "impacts"
)]
async fn assess(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<AssessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RecordedAssessment>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    let period = resolve_period(req.period.as_deref())?;

    let recorded =
        assessments::assess_pair(&state, req.policy_id, req.company_id, period, Utc::now()).await?;
    let status = if recorded.outcome == "unchanged" {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(ApiResponse::ok(recorded))))
}

/// POST /api/v1/impacts/assess-policy — Assess a policy across the
/// companies in its affected industries that operate in its jurisdiction.
#[utoipa::path(
    post,
    path = "/api/v1/impacts/assess-policy",
    request_body = AssessPolicyRequest,
    responses(
        (status = 200, description = "Batch summary (data)", body = BatchSummary),
        (status = 404, description = "Policy not found", body = crate::error::ErrorBody),
    ),
    tag = "impacts"
)]
async fn assess_policy(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<AssessPolicyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BatchSummary>>, AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    let period = resolve_period(req.period.as_deref())?;
    let summary = assessments::assess_policy(&state, req.policy_id, period, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_defaults_to_current_year() {
        let period = resolve_period(None).unwrap();
        assert_eq!(period, AssessmentPeriod::current(Utc::now()));
        assert_eq!(resolve_period(Some("2025-2026")).unwrap().as_str(), "2025-2026");
        assert!(resolve_period(Some("2025")).is_err());
    }

    #[test]
    fn list_query_rejects_bad_period() {
        let q = ImpactListQuery {
            period: Some("later".into()),
            ..ImpactListQuery::default()
        };
        assert!(q.validate().is_err());
    }
}
