//! # radar-forecast — Policy Prediction Engine
//!
//! Forecasts policy trajectories from historical policy records and keeps
//! the issued predictions as an immutable, supersession-linked book.
//!
//! ## Models
//!
//! | Model | Type | Serves |
//! |---|---|---|
//! | `holt-linear-impact` | time_series | impact_forecast, risk_assessment |
//! | `poisson-change-hazard` | econometric | policy_change |
//! | `empirical-enactment-timeline` | regression | timeline_prediction |
//!
//! ## Accuracy Tracking
//!
//! Accuracy is measured, never assumed. Realised values are recorded as
//! [`radar_core::PredictionOutcome`]s against the prediction that forecast
//! them, [`ModelPerformance`] aggregates hit rate and MAPE per model, and
//! [`backtest()`] replays a series with a rolling origin.

pub mod backtest;
pub mod book;
pub mod error;
pub mod forecaster;
pub mod hazard;
pub mod holt;
pub mod outcome;
pub mod registry;
pub mod series;
pub mod stats;
pub mod timeline;

pub use backtest::{backtest, BacktestReport};
pub use book::PredictionBook;
pub use error::ForecastError;
pub use forecaster::{ForecastContext, ForecastRequest, Forecaster};
pub use hazard::HazardEstimate;
pub use holt::HoltFit;
pub use outcome::{score_outcome, ModelPerformance};
pub use registry::ModelRegistry;
pub use series::{monthly_series, MonthlySeries, SeriesKind};
pub use timeline::TimelineEstimate;
