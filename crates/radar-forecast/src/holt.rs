//! # Holt Linear Smoothing
//!
//! Double exponential smoothing with level and trend. Smoothing constants
//! are chosen by grid search on one-step-ahead squared error; the residual
//! standard error sets an interval that widens with `√h`.

use radar_core::ForecastPoint;
use serde::Serialize;

use crate::error::ForecastError;

/// Minimum observations for a fit.
pub const MIN_POINTS: usize = 3;

const ALPHA_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const BETA_GRID: [f64; 5] = [0.05, 0.1, 0.2, 0.3, 0.5];

/// A fitted Holt model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoltFit {
    /// Level smoothing constant.
    pub alpha: f64,
    /// Trend smoothing constant.
    pub beta: f64,
    /// Final level.
    pub level: f64,
    /// Final trend per month.
    pub trend: f64,
    /// One-step sum of squared errors.
    pub sse: f64,
    /// Residual standard error, `√(SSE / (n − 2))`.
    pub sigma: f64,
    /// Observations fitted.
    pub n: usize,
}

impl HoltFit {
    /// Fit by grid search over `(alpha, beta)`.
    pub fn fit(y: &[f64]) -> Result<Self, ForecastError> {
        if y.len() < MIN_POINTS {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_POINTS,
                got: y.len(),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NotFinite("series value"));
        }

        let mut best: Option<Self> = None;
        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                let candidate = Self::run(y, alpha, beta);
                if best.map_or(true, |b| candidate.sse < b.sse) {
                    best = Some(candidate);
                }
            }
        }
        // The grids are non-empty, so a candidate always exists.
        best.ok_or(ForecastError::InsufficientHistory {
            needed: MIN_POINTS,
            got: y.len(),
        })
    }

    fn run(y: &[f64], alpha: f64, beta: f64) -> Self {
        let mut level = y[0];
        let mut trend = y[1] - y[0];
        let mut sse = 0.0;
        for &obs in &y[1..] {
            let predicted = level + trend;
            let err = obs - predicted;
            sse += err * err;
            let prev_level = level;
            level = alpha * obs + (1.0 - alpha) * (level + trend);
            trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        }
        let n = y.len();
        Self {
            alpha,
            beta,
            level,
            trend,
            sse,
            sigma: (sse / (n - 2) as f64).sqrt(),
            n,
        }
    }

    /// Point forecast and interval `h` months ahead.
    pub fn forecast(&self, h: u32, z: f64) -> ForecastPoint {
        let steps = f64::from(h.max(1));
        let value = self.level + steps * self.trend;
        let half = z * self.sigma * steps.sqrt();
        ForecastPoint {
            period: h.max(1),
            value,
            lower: value - half,
            upper: value + half,
        }
    }

    /// Forecasts for months `1..=horizon`.
    pub fn trajectory(&self, horizon: u32, z: f64) -> Vec<ForecastPoint> {
        (1..=horizon).map(|h| self.forecast(h, z)).collect()
    }
}

/// Clamp a trajectory into `[lo, hi]` (used for share series).
pub fn clamp_trajectory(points: &mut [ForecastPoint], lo: f64, hi: f64) {
    for p in points {
        p.value = p.value.clamp(lo, hi);
        p.lower = p.lower.clamp(lo, hi);
        p.upper = p.upper.clamp(lo, hi);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Interval width never shrinks as the horizon grows.
        #[test]
        fn interval_widens_with_horizon(
            y in prop::collection::vec(-1_000.0f64..1_000.0, 3..36),
            z in 0.5f64..3.0,
        ) {
            let fit = HoltFit::fit(&y).unwrap();
            let traj = fit.trajectory(12, z);
            for pair in traj.windows(2) {
                let w0 = pair[0].upper - pair[0].lower;
                let w1 = pair[1].upper - pair[1].lower;
                prop_assert!(w1 + 1e-9 >= w0);
                prop_assert!(pair[0].lower <= pair[0].value && pair[0].value <= pair[0].upper);
            }
        }
    }
}
