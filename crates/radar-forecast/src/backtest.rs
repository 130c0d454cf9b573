//! # Rolling-Origin Backtest
//!
//! Replays a monthly series: for each origin `t`, fit Holt on `y[..t]` and
//! compare the `h`-step forecast with `y[t + h − 1]`.

use serde::Serialize;

use crate::error::ForecastError;
use crate::holt::{HoltFit, MIN_POINTS};
use crate::stats::{mean, z_for_confidence};

/// Backtest summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BacktestReport {
    /// Forecast origins evaluated.
    pub origins: usize,
    /// Steps ahead.
    pub horizon: u32,
    /// Minimum training length.
    pub min_train: usize,
    /// Nominal interval level.
    pub confidence_level: f64,
    /// Mean absolute percentage error over non-zero actuals.
    pub mape: Option<f64>,
    /// Share of actuals inside the interval.
    pub coverage: Option<f64>,
    /// Mean absolute error.
    pub mean_abs_error: Option<f64>,
}

/// Run a rolling-origin backtest over `series`.
pub fn backtest(
    series: &[f64],
    horizon: u32,
    min_train: usize,
    confidence: f64,
) -> Result<BacktestReport, ForecastError> {
    if horizon == 0 {
        return Err(ForecastError::InvalidHorizon(horizon));
    }
    let z = z_for_confidence(confidence)?;
    let min_train = min_train.max(MIN_POINTS);
    let h = horizon as usize;
    if series.len() < min_train + h {
        return Err(ForecastError::InsufficientHistory {
            needed: min_train + h,
            got: series.len(),
        });
    }

    let mut abs_errors = Vec::new();
    let mut pct_errors = Vec::new();
    let mut hits = Vec::new();
    for t in min_train..=series.len() - h {
        let fit = HoltFit::fit(&series[..t])?;
        let point = fit.forecast(horizon, z);
        let actual = series[t + h - 1];
        let err = (actual - point.value).abs();
        abs_errors.push(err);
        if actual != 0.0 {
            pct_errors.push(err / actual.abs());
        }
        hits.push(if point.lower <= actual && actual <= point.upper { 1.0 } else { 0.0 });
    }

    let report = BacktestReport {
        origins: abs_errors.len(),
        horizon,
        min_train,
        confidence_level: confidence,
        mape: mean(&pct_errors),
        coverage: mean(&hits),
        mean_abs_error: mean(&abs_errors),
    };
    tracing::debug!(
        origins = report.origins,
        horizon,
        mape = ?report.mape,
        coverage = ?report.coverage,
        "backtest complete"
    );
    Ok(report)
}
