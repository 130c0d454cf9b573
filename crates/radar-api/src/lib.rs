//! # radar-api — Axum API Services for PolicyRadar
//!
//! Serves the policy and company registries, the impact assessment ledger,
//! the prediction book, market data, analytics, the dashboard feed and
//! report generation over HTTP.
//!
//! ## API Surface
//!
//! | Prefix                         | Module                     | Domain               |
//! |--------------------------------|----------------------------|----------------------|
//! | `/api/v1/policies/*`           | [`routes::policies`]       | Policies, categories |
//! | `/api/v1/companies/*`          | [`routes::companies`]      | Companies, profiles  |
//! | `/api/v1/impacts/*`            | [`routes::impacts`]        | Impact assessments   |
//! | `/api/v1/predictions/*`        | [`routes::predictions`]    | Forecasts, models    |
//! | `/api/v1/market-data/*`        | [`routes::market`]         | Prices, trade flows  |
//! | `/api/v1/analytics/*`          | [`routes::analytics`]      | Scenario, trends     |
//! | `/api/v1/dashboard/*`          | [`routes::dashboard`]      | Dashboard summary    |
//! | `/api/v1/reports/*`            | [`routes::reports`]        | Reports              |
//! | `/`, `/health/*`, `/metrics`   | [`routes::health`]         | Unauthenticated      |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CORS → TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod assessments;
pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod db;
pub mod envelope;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};

/// Request bodies above this size are rejected with 413.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// The service banner, health probes and `/metrics` are mounted outside
/// the auth middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = state.metrics.clone();
    let limiter = RateLimiter::new(RateLimitConfig::per_minute(
        state.config.rate_limit_per_minute,
    ));

    let api = routes::api_router()
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .layer(axum::Extension(limiter))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let health = routes::health::router(state.config.metrics_enabled).with_state(state);

    Router::new().merge(health).merge(api)
}
