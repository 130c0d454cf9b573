//! # Service Banner, Health Probes and Metrics
//!
//! Mounted outside the auth middleware so orchestrators and scrapers can
//! reach them without credentials.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use radar_core::RiskLevel;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ErrorBody;
use crate::state::AppState;

/// `GET /health` body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// Always `healthy` when the process answers.
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// `GET /` body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceBanner {
    pub name: String,
    pub version: String,
    pub status: String,
    /// Path of the OpenAPI document.
    pub docs: String,
    /// `postgres` or `in-memory`.
    pub storage: String,
}

/// Build the unauthenticated router. `/metrics` is mounted only when
/// metrics are enabled.
pub fn router(metrics_enabled: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));
    if metrics_enabled {
        router.route("/metrics", get(prometheus_metrics))
    } else {
        router
    }
}

/// GET / — Service banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service banner", body = ServiceBanner)),
    tag = "health"
)]
async fn banner(State(state): State<AppState>) -> Json<ServiceBanner> {
    Json(ServiceBanner {
        name: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        status: "running".to_string(),
        docs: "/openapi.json".to_string(),
        storage: if state.db_pool.is_some() {
            "postgres".to_string()
        } else {
            "in-memory".to_string()
        },
    })
}

/// GET /health — Health check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthStatus)),
    tag = "health"
)]
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: state.config.app_version.clone(),
    })
}

/// Liveness probe: 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: stores readable and, when configured, the database
/// answering `SELECT 1`.
async fn readiness(State(state): State<AppState>) -> Response {
    let _ = state.policies.len();
    let _ = state.ledger.read().len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database readiness check failed");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody::new("UNAVAILABLE", "database unreachable")),
            )
                .into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics — Prometheus scrape endpoint. Domain gauges are refreshed
/// from the stores on every scrape.
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    let metrics = &state.metrics;
    metrics.policies_total().set(state.policies.len() as f64);
    metrics.companies_total().set(state.companies.len() as f64);
    metrics
        .predictions_total()
        .set(state.predictions.read().len() as f64);

    let mut by_level: BTreeMap<&'static str, usize> = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ]
    .into_iter()
    .map(|l| (l.as_str(), 0))
    .collect();
    for a in state.ledger.read().all_active() {
        *by_level.entry(a.risk_level.as_str()).or_default() += 1;
    }
    for (level, count) in &by_level {
        metrics
            .assessments_active()
            .with_label_values(&[level])
            .set(*count as f64);
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
