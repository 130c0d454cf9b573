//! # Policy-Change Hazard
//!
//! Changes (amendments, repeals, extensions) are treated as a Poisson
//! process. The rate is a shrunk estimate `(k + 0.5) / (T + 6)`: half a
//! pseudo-event over six pseudo-months keeps a policy with no history from
//! forecasting zero risk.

use chrono::{DateTime, Utc};
use radar_core::ForecastPoint;
use serde::Serialize;

use crate::stats::months_between;

const PRIOR_EVENTS: f64 = 0.5;
const PRIOR_MONTHS: f64 = 6.0;

/// Observed change count and exposure window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HazardEstimate {
    /// Changes observed.
    pub changes: usize,
    /// Exposure in months.
    pub exposure_months: f64,
}

impl HazardEstimate {
    /// Start with no observations.
    pub fn empty() -> Self {
        Self {
            changes: 0,
            exposure_months: 0.0,
        }
    }

    /// Observation for one policy: changes dated in `[window_start, as_of]`.
    pub fn observe<I>(change_dates: I, window_start: DateTime<Utc>, as_of: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let changes = change_dates
            .into_iter()
            .filter(|d| *d >= window_start && *d <= as_of)
            .count();
        Self {
            changes,
            exposure_months: months_between(window_start, as_of).max(0.0),
        }
    }

    /// Pool two observations.
    pub fn pool(self, other: Self) -> Self {
        Self {
            changes: self.changes + other.changes,
            exposure_months: self.exposure_months + other.exposure_months,
        }
    }

    /// Shrunk monthly rate.
    pub fn rate(&self) -> f64 {
        (self.changes as f64 + PRIOR_EVENTS) / (self.exposure_months + PRIOR_MONTHS)
    }

    /// Standard error of the rate.
    pub fn rate_std_error(&self) -> f64 {
        (self.changes as f64 + PRIOR_EVENTS).sqrt() / (self.exposure_months + PRIOR_MONTHS)
    }

    /// Probability of at least one change within `h` months.
    pub fn probability_within(&self, h: u32) -> f64 {
        1.0 - (-self.rate() * f64::from(h)).exp()
    }

    /// Expected number of changes within `h` months with a `z` interval.
    pub fn forecast(&self, h: u32, z: f64) -> ForecastPoint {
        let steps = f64::from(h);
        let rate = self.rate();
        let spread = z * self.rate_std_error();
        ForecastPoint {
            period: h,
            value: rate * steps,
            lower: ((rate - spread) * steps).max(0.0),
            upper: (rate + spread) * steps,
        }
    }

    /// Cumulative expected changes for months `1..=horizon`.
    pub fn trajectory(&self, horizon: u32, z: f64) -> Vec<ForecastPoint> {
        (1..=horizon).map(|h| self.forecast(h, z)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn no_history_uses_prior() {
        let h = HazardEstimate::empty();
        assert!((h.rate() - 0.5 / 6.0).abs() < 1e-12);
        assert!(h.probability_within(12) > 0.0);
    }

    #[test]
    fn counts_changes_inside_window_only() {
        let dates = vec![at(2023, 6), at(2024, 3), at(2024, 9), at(2026, 1)];
        let h = HazardEstimate::observe(dates, at(2024, 1), at(2025, 1));
        assert_eq!(h.changes, 2);
        assert!((h.exposure_months - 12.0).abs() < 0.1);
        // (2 + 0.5) / (12 + 6)
        assert!((h.rate() - 2.5 / (h.exposure_months + 6.0)).abs() < 1e-12);
    }

    #[test]
    fn pooling_adds_counts_and_exposure() {
        let a = HazardEstimate {
            changes: 1,
            exposure_months: 10.0,
        };
        let b = HazardEstimate {
            changes: 3,
            exposure_months: 20.0,
        };
        let p = a.pool(b);
        assert_eq!(p.changes, 4);
        assert_eq!(p.exposure_months, 30.0);
    }

    #[test]
    fn forecast_interval_floored_at_zero() {
        let h = HazardEstimate::empty();
        let p = h.forecast(6, 3.0);
        assert!(p.lower >= 0.0);
        assert!(p.upper > p.value);
        assert!((p.value - h.rate() * 6.0).abs() < 1e-12);
    }

    #[test]
    fn probability_increases_with_horizon() {
        let h = HazardEstimate {
            changes: 2,
            exposure_months: 24.0,
        };
        assert!(h.probability_within(12) > h.probability_within(3));
        assert!(h.probability_within(1200) <= 1.0);
    }
}
