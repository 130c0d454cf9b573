//! # Report API
//!
//! Reports are JSON data bundles assembled from the stores and kept in
//! memory under a timestamped ID. Binary formats are not produced.

use std::collections::{BTreeMap, HashMap};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use radar_core::{ImpactAssessment, ImpactDirection, PredictionType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::ApiResponse;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::analytics::{compute_risk_analysis, risk_distribution, risk_inputs};
use crate::routes::policies::summarize;
use crate::state::{AppState, ReportRecord};

const TOP_IMPACTS: usize = 10;

/// Build the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/reports/generate", post(generate_report))
        .route("/api/v1/reports/:id", get(get_report))
}

// ── Types ───────────────────────────────────────────────────────────

/// Kinds of report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Active assessments: totals, direction split, risk mix, largest impacts.
    ImpactSummary,
    /// Risk distribution by industry and jurisdiction with top exposures.
    RiskAnalysis,
    /// Registry statistics, or one policy with its changes and assessments.
    PolicyOverview,
    /// Per-model hit rate and error against the configured targets.
    PredictionAccuracy,
}

impl ReportType {
    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImpactSummary => "impact_summary",
            Self::RiskAnalysis => "risk_analysis",
            Self::PolicyOverview => "policy_overview",
            Self::PredictionAccuracy => "prediction_accuracy",
        }
    }
}

/// Output formats a caller may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Json,
    Pdf,
    Excel,
}

impl ReportFormat {
    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Excel => "excel",
        }
    }
}

/// Request for `POST /api/v1/reports/generate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    pub report_type: ReportType,
    /// Defaults to `json`, the only format produced.
    #[serde(default)]
    pub format: ReportFormat,
    /// Restrict to one company's assessments.
    pub company_id: Option<Uuid>,
    /// Restrict to one policy.
    pub policy_id: Option<Uuid>,
}

impl Validate for GenerateReportRequest {
    fn validate(&self) -> Result<(), String> {
        if self.format != ReportFormat::Json {
            return Err(format!(
                "report format '{}' is not supported; use 'json'",
                self.format.as_str()
            ));
        }
        Ok(())
    }
}

// ── Builders ────────────────────────────────────────────────────────

/// `REP_YYYYmmdd_HHMMSS`, suffixed `_2`, `_3`, ... while `taken` says the
/// ID is in use.
pub fn report_id(now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let base = format!("REP_{}", now.format("%Y%m%d_%H%M%S"));
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|id| !taken(id))
        .unwrap_or(base)
}

fn scoped<'a>(
    assessments: &'a [ImpactAssessment],
    company_id: Option<Uuid>,
    policy_id: Option<Uuid>,
) -> Vec<&'a ImpactAssessment> {
    assessments
        .iter()
        .filter(|a| {
            a.is_active()
                && company_id.map_or(true, |id| a.company_id == id)
                && policy_id.map_or(true, |id| a.policy_id == id)
        })
        .collect()
}

fn impact_summary(rows: &[&ImpactAssessment]) -> serde_json::Value {
    let total: f64 = rows.iter().map(|a| a.overall_impact).sum();
    let mut by_direction: BTreeMap<&'static str, usize> = BTreeMap::new();
    for a in rows {
        let key = match a.impact_direction {
            ImpactDirection::Positive => "positive",
            ImpactDirection::Negative => "negative",
            ImpactDirection::Neutral => "neutral",
            ImpactDirection::Mixed => "mixed",
        };
        *by_direction.entry(key).or_default() += 1;
    }
    let mut largest: Vec<&&ImpactAssessment> = rows.iter().collect();
    largest.sort_by(|a, b| {
        a.overall_impact
            .total_cmp(&b.overall_impact)
            .then_with(|| a.id.cmp(&b.id))
    });
    let largest: Vec<serde_json::Value> = largest
        .into_iter()
        .take(TOP_IMPACTS)
        .map(|a| {
            json!({
                "assessment_id": a.id,
                "policy_id": a.policy_id,
                "company_id": a.company_id,
                "overall_impact": a.overall_impact,
                "risk_level": a.risk_level,
                "assessment_period": a.assessment_period,
            })
        })
        .collect();

    json!({
        "total_assessments": rows.len(),
        "total_impact": total,
        "average_impact": (!rows.is_empty()).then(|| total / rows.len() as f64),
        "revenue_impact": rows.iter().map(|a| a.revenue_impact).sum::<f64>(),
        "cost_impact": rows.iter().map(|a| a.cost_impact).sum::<f64>(),
        "mitigation_cost": rows.iter().map(|a| a.mitigation_cost).sum::<f64>(),
        "by_direction": by_direction,
        "risk_distribution": risk_distribution(rows.iter().copied()),
        "largest_negative_impacts": largest,
    })
}

fn build_report(
    state: &AppState,
    req: &GenerateReportRequest,
) -> Result<serde_json::Value, AppError> {
    if let Some(id) = req.company_id {
        if !state.companies.contains(&id) {
            return Err(AppError::NotFound(format!("company {id} not found")));
        }
    }
    if let Some(id) = req.policy_id {
        if !state.policies.contains(&id) {
            return Err(AppError::NotFound(format!("policy {id} not found")));
        }
    }

    let data = match req.report_type {
        ReportType::ImpactSummary => {
            let (assessments, _, _) = risk_inputs(state);
            impact_summary(&scoped(&assessments, req.company_id, req.policy_id))
        }
        ReportType::RiskAnalysis => {
            let (assessments, policies, companies) = risk_inputs(state);
            let rows: Vec<ImpactAssessment> = scoped(&assessments, req.company_id, req.policy_id)
                .into_iter()
                .cloned()
                .collect();
            serde_json::to_value(compute_risk_analysis(&rows, &policies, &companies, TOP_IMPACTS))
                .map_err(|e| AppError::Internal(format!("failed to serialise report: {e}")))?
        }
        ReportType::PolicyOverview => match req.policy_id {
            Some(id) => {
                let policy = state.policies.get(&id);
                let mut changes = state.policy_changes.filter(|c| c.policy_id == id);
                changes.sort_by_key(|c| (c.change_date, c.id));
                let (assessments, _, _) = risk_inputs(state);
                let rows = scoped(&assessments, req.company_id, Some(id));
                json!({
                    "policy": policy,
                    "changes": changes,
                    "impact": impact_summary(&rows),
                })
            }
            None => serde_json::to_value(summarize(&state.policies.list()))
                .map_err(|e| AppError::Internal(format!("failed to serialise report: {e}")))?,
        },
        ReportType::PredictionAccuracy => {
            let book = state.predictions.read();
            let registry = state.forecaster.registry();
            let models: Vec<serde_json::Value> = registry
                .list()
                .into_iter()
                .map(|m| {
                    let perf = book.performance(m.id);
                    json!({
                        "model_id": m.id,
                        "name": m.name,
                        "version": m.version,
                        "predictions": perf.predictions,
                        "outcomes": perf.outcomes,
                        "hit_rate": perf.hit_rate,
                        "mean_accuracy": perf.mean_accuracy,
                        "mape": perf.mape,
                        "meets_hit_rate_target": perf
                            .hit_rate
                            .map(|h| h >= state.config.confidence_threshold),
                    })
                })
                .collect();
            let by_type: BTreeMap<&'static str, usize> = PredictionType::ALL
                .iter()
                .map(|t| {
                    (
                        t.as_str(),
                        book.list().iter().filter(|p| p.prediction_type == *t).count(),
                    )
                })
                .collect();
            let impact_outcomes: Vec<f64> = book
                .outcomes()
                .filter(|o| {
                    book.get(o.prediction_id)
                        .is_some_and(|p| p.prediction_type == PredictionType::ImpactForecast)
                })
                .map(|o| o.percentage_error)
                .collect();
            let impact_mape = (!impact_outcomes.is_empty())
                .then(|| impact_outcomes.iter().sum::<f64>() / impact_outcomes.len() as f64);
            json!({
                "total_predictions": book.len(),
                "overall_hit_rate": book.overall_hit_rate(),
                "hit_rate_target": state.config.confidence_threshold,
                "impact_mape": impact_mape,
                "impact_error_target": 1.0 - state.config.impact_accuracy_target,
                "by_type": by_type,
                "models": models,
            })
        }
    };
    Ok(data)
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/reports/generate — Build and store a report.
#[utoipa::path(
    post,
    path = "/api/v1/reports/generate",
    request_body = GenerateReportRequest,
    responses(
        (status = 201, description = "Report generated (data)", body = ReportRecord),
        (status = 404, description = "Company or policy not found", body = crate::error::ErrorBody),
        (status = 422, description = "Unsupported format", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn generate_report(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<GenerateReportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ReportRecord>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    let data = build_report(&state, &req)?;

    let now = Utc::now();
    let record = {
        let mut reports = state.reports.write();
        let record = ReportRecord {
            report_id: report_id(now, |id| reports.contains_key(id)),
            report_type: req.report_type.as_str().to_string(),
            format: req.format.as_str().to_string(),
            parameters: json!({
                "company_id": req.company_id,
                "policy_id": req.policy_id,
            }),
            data,
            generated_at: now,
        };
        reports.insert(record.report_id.clone(), record.clone());
        record
    };

    tracing::info!(
        report_id = %record.report_id,
        report_type = %record.report_type,
        "Report generated"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// GET /api/v1/reports/:id — Fetch a generated report.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report found (data)", body = ReportRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "reports"
)]
async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ReportRecord>>, AppError> {
    state
        .reports
        .read()
        .get(&id)
        .cloned()
        .map(|r| Json(ApiResponse::ok(r)))
        .ok_or_else(|| AppError::NotFound(format!("report {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn report_ids_are_timestamped_and_unique() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 5).unwrap();
        assert_eq!(report_id(now, |_| false), "REP_20250601_093005");

        let taken: HashSet<String> = ["REP_20250601_093005", "REP_20250601_093005_2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(report_id(now, |id| taken.contains(id)), "REP_20250601_093005_3");
    }

    #[test]
    fn binary_formats_rejected() {
        let req = GenerateReportRequest {
            report_type: ReportType::ImpactSummary,
            format: ReportFormat::Pdf,
            company_id: None,
            policy_id: None,
        };
        assert!(req.validate().unwrap_err().contains("pdf"));
    }

    #[test]
    fn empty_impact_summary() {
        let v = impact_summary(&[]);
        assert_eq!(v["total_assessments"], 0);
        assert!(v["average_impact"].is_null());
    }

    #[test]
    fn unknown_policy_is_not_found() {
        let state = AppState::new();
        let req = GenerateReportRequest {
            report_type: ReportType::PolicyOverview,
            format: ReportFormat::Json,
            company_id: None,
            policy_id: Some(Uuid::new_v4()),
        };
        assert!(matches!(build_report(&state, &req), Err(AppError::NotFound(_))));
    }

    #[test]
    fn prediction_accuracy_lists_every_model() {
        let state = AppState::new();
        let req = GenerateReportRequest {
            report_type: ReportType::PredictionAccuracy,
            format: ReportFormat::Json,
            company_id: None,
            policy_id: None,
        };
        let data = build_report(&state, &req).unwrap();
        assert_eq!(
            data["models"].as_array().unwrap().len(),
            state.forecaster.registry().list().len()
        );
        assert!(data["overall_hit_rate"].is_null());
    }
}
