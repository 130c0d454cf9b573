//! Dashboard data feed. Every figure is computed from the stores.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use radar_core::{ImpactAssessment, Policy, PolicyChange, RiskLevel};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::envelope::ApiResponse;
use crate::error::AppError;
use crate::routes::analytics::risk_distribution;
use crate::state::AppState;

const MAX_ALERTS: usize = 10;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/dashboard/summary", get(summary))
}

/// A recent event worth surfacing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardAlert {
    /// `policy_change` or `impact_alert`.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    /// `low`, `medium`, `high` or `critical`.
    pub severity: String,
    pub timestamp: DateTime<Utc>,
    /// Change or assessment the alert refers to.
    pub reference_id: Uuid,
}

/// `GET /api/v1/dashboard/summary` body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub total_policies: usize,
    /// Policies currently in force.
    pub active_policies: usize,
    pub high_risk_policies: usize,
    pub total_companies: usize,
    /// Companies with at least one active assessment.
    pub affected_companies: usize,
    /// Active assessments.
    pub total_impact_assessments: usize,
    /// Mean `overall_impact` of active assessments (M USD).
    pub average_impact: Option<f64>,
    /// Share of scored predictions whose interval covered the outcome.
    pub prediction_accuracy: Option<f64>,
    pub total_predictions: usize,
    pub recent_alerts: Vec<DashboardAlert>,
    pub risk_distribution: BTreeMap<String, usize>,
}

fn change_severity(change: &PolicyChange) -> RiskLevel {
    RiskLevel::from_score(change.impact_magnitude.unwrap_or(0.0).abs())
}

/// Most recent policy changes and elevated assessments, newest first.
pub fn recent_alerts(
    changes: &[PolicyChange],
    assessments: &[&ImpactAssessment],
    policies: &HashMap<Uuid, Policy>,
) -> Vec<DashboardAlert> {
    let title_of = |id: &Uuid| {
        policies
            .get(id)
            .map_or_else(|| id.to_string(), |p| p.title.clone())
    };

    let mut alerts: Vec<DashboardAlert> = changes
        .iter()
        .map(|c| DashboardAlert {
            kind: "policy_change".to_string(),
            title: format!("{:?} of {}", c.change_type, title_of(&c.policy_id)),
            severity: change_severity(c).as_str().to_string(),
            timestamp: c.change_date,
            reference_id: c.id,
        })
        .chain(
            assessments
                .iter()
                .filter(|a| a.risk_level >= RiskLevel::High)
                .map(|a| DashboardAlert {
                    kind: "impact_alert".to_string(),
                    title: format!("{} impact from {}", a.risk_level, title_of(&a.policy_id)),
                    severity: a.risk_level.as_str().to_string(),
                    timestamp: a.assessment_date,
                    reference_id: a.id,
                }),
        )
        .collect();
    alerts.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.reference_id.cmp(&b.reference_id))
    });
    alerts.truncate(MAX_ALERTS);
    alerts
}

/// Compute the dashboard summary from the current stores.
pub fn compute_summary(state: &AppState) -> DashboardSummary {
    let policies = state.policies.list();
    let changes = state.policy_changes.list();
    let policy_index: HashMap<Uuid, Policy> =
        policies.iter().map(|p| (p.id, p.clone())).collect();

    let ledger = state.ledger.read();
    let active = ledger.all_active();
    let affected: HashSet<Uuid> = active.iter().map(|a| a.company_id).collect();
    let average_impact = (!active.is_empty())
        .then(|| active.iter().map(|a| a.overall_impact).sum::<f64>() / active.len() as f64);

    let (prediction_accuracy, total_predictions) = {
        let book = state.predictions.read();
        (book.overall_hit_rate(), book.len())
    };

    DashboardSummary {
        total_policies: policies.len(),
        active_policies: policies.iter().filter(|p| p.status.is_in_force()).count(),
        high_risk_policies: policies.iter().filter(|p| p.is_high_risk()).count(),
        total_companies: state.companies.len(),
        affected_companies: affected.len(),
        total_impact_assessments: active.len(),
        average_impact,
        prediction_accuracy,
        total_predictions,
        recent_alerts: recent_alerts(&changes, &active, &policy_index),
        risk_distribution: risk_distribution(active.iter().copied()),
    }
}

/// GET /api/v1/dashboard/summary — Dashboard headline figures.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses((status = 200, description = "Dashboard summary (data)", body = DashboardSummary)),
    tag = "dashboard"
)]
async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let summary = state
        .cache
        .get_or_compute("dashboard:summary".to_string(), || async {
            Ok::<_, AppError>(compute_summary(&state))
        })
        .await?;
    Ok(Json(ApiResponse::ok(summary)))
}
