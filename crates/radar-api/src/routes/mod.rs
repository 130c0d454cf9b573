//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! [`api_router`] merges the authenticated ones; `health` is mounted
//! separately in [`crate::app`].

pub mod analytics;
pub mod companies;
pub mod dashboard;
pub mod health;
pub mod impacts;
pub mod market;
pub mod policies;
pub mod predictions;
pub mod reports;

use axum::Router;

use crate::state::AppState;

/// Every `/api/v1` router merged into one.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(policies::router())
        .merge(companies::router())
        .merge(impacts::router())
        .merge(predictions::router())
        .merge(market::router())
        .merge(analytics::router())
        .merge(dashboard::router())
        .merge(reports::router())
}
