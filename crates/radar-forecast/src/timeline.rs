//! # Enactment Timeline
//!
//! Empirical distribution of months from proposal to enactment. The
//! prediction is the median; the interval comes from empirical quantiles at
//! `(1 − c) / 2` and `(1 + c) / 2`. Enactments after the forecast origin
//! are not yet known and never enter the sample.

use chrono::{DateTime, Utc};
use radar_core::Policy;
use serde::Serialize;

use crate::error::ForecastError;
use crate::stats::{months_between, quantile};

/// Minimum durations needed before the jurisdiction's own history is used.
pub const MIN_SAMPLES: usize = 3;

/// Summary of enactment durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineEstimate {
    /// Median months to enactment.
    pub median: f64,
    /// Lower empirical quantile.
    pub lower: f64,
    /// Upper empirical quantile.
    pub upper: f64,
    /// Durations used.
    pub samples: usize,
    /// Whether every jurisdiction was pooled because the target had too few.
    pub pooled: bool,
}

fn durations<'a>(policies: impl Iterator<Item = &'a Policy>, as_of: DateTime<Utc>) -> Vec<f64> {
    let mut out: Vec<f64> = policies
        .filter_map(|p| match (p.proposed_date, p.enacted_date) {
            (Some(proposed), Some(enacted)) if enacted >= proposed && enacted <= as_of => {
                Some(months_between(proposed, enacted))
            }
            _ => None,
        })
        .collect();
    out.sort_by(f64::total_cmp);
    out
}

impl TimelineEstimate {
    /// Estimate from policies in `jurisdiction` enacted on or before
    /// `as_of`, falling back to all jurisdictions when fewer than
    /// [`MIN_SAMPLES`] are available.
    pub fn estimate(
        policies: &[Policy],
        jurisdiction: &str,
        confidence: f64,
        as_of: DateTime<Utc>,
    ) -> Result<Self, ForecastError> {
        let mut pooled = false;
        let mut sample = durations(
            policies.iter().filter(|p| p.jurisdiction.matches(jurisdiction)),
            as_of,
        );
        if sample.len() < MIN_SAMPLES {
            pooled = true;
            sample = durations(policies.iter(), as_of);
        }
        if sample.len() < MIN_SAMPLES {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_SAMPLES,
                got: sample.len(),
            });
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ForecastError::InvalidConfidence(confidence));
        }
        Ok(Self {
            median: quantile(&sample, 0.5),
            lower: quantile(&sample, (1.0 - confidence) / 2.0),
            upper: quantile(&sample, (1.0 + confidence) / 2.0),
            samples: sample.len(),
            pooled,
        })
    }
}
