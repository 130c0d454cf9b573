//! # Monthly Policy Series
//!
//! Buckets policies by the month they were proposed (creation month when
//! no proposal date is known) and fills empty months with zero, so the
//! smoothing models see an evenly spaced series.

use chrono::{DateTime, NaiveDate, Utc};
use radar_core::Policy;
use serde::Serialize;

use crate::stats::{month_index, month_start};

/// Which value each month carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Sum of `estimated_impact` (M USD).
    Impact,
    /// Share of high-risk policies in `[0, 1]`.
    Risk,
    /// Number of policies proposed.
    Count,
}

/// Evenly spaced monthly values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySeries {
    /// First day of the first month.
    pub start: NaiveDate,
    /// One value per month, oldest first.
    pub values: Vec<f64>,
}

impl MonthlySeries {
    /// Number of months.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no months.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First day of each month, aligned with `values`.
    pub fn months(&self) -> Vec<NaiveDate> {
        let first = month_index(self.start);
        (0..self.values.len() as i32)
            .filter_map(|i| month_start(first + i))
            .collect()
    }

    /// Keep only the last `n` months.
    pub fn tail(mut self, n: usize) -> Self {
        if self.values.len() > n {
            let drop = self.values.len() - n;
            self.values.drain(..drop);
            if let Some(start) = month_start(month_index(self.start) + drop as i32) {
                self.start = start;
            }
        }
        self
    }
}

/// Build a monthly series for a jurisdiction (and optionally an industry).
///
/// Economy-wide policies count toward every industry. When `until` is given
/// the series is extended with empty months up to that date.
pub fn monthly_series(
    policies: &[Policy],
    jurisdiction: &str,
    industry: Option<&str>,
    kind: SeriesKind,
    until: Option<DateTime<Utc>>,
) -> MonthlySeries {
    let selected: Vec<&Policy> = policies
        .iter()
        .filter(|p| p.jurisdiction.matches(jurisdiction))
        .filter(|p| industry.map_or(true, |i| p.affects_industry(i)))
        .collect();

    let indices: Vec<i32> = selected
        .iter()
        .map(|p| month_index(p.reference_date().date_naive()))
        .collect();

    let (Some(&first), Some(&last)) = (indices.iter().min(), indices.iter().max()) else {
        return MonthlySeries {
            start: until
                .map(|u| u.date_naive())
                .and_then(|d| month_start(month_index(d)))
                .unwrap_or(NaiveDate::MIN),
            values: Vec::new(),
        };
    };
    let last = until
        .map(|u| month_index(u.date_naive()).max(last))
        .unwrap_or(last);

    let len = (last - first + 1) as usize;
    let mut sums = vec![0.0; len];
    let mut counts = vec![0usize; len];
    let mut risky = vec![0usize; len];

    for (policy, idx) in selected.iter().zip(&indices) {
        let slot = (idx - first) as usize;
        counts[slot] += 1;
        sums[slot] += policy.estimated_impact.unwrap_or(0.0);
        if policy.is_high_risk() {
            risky[slot] += 1;
        }
    }

    let values = match kind {
        SeriesKind::Impact => sums,
        SeriesKind::Count => counts.iter().map(|&c| c as f64).collect(),
        SeriesKind::Risk => counts
            .iter()
            .zip(&risky)
            .map(|(&c, &r)| if c == 0 { 0.0 } else { r as f64 / c as f64 })
            .collect(),
    };

    MonthlySeries {
        start: month_start(first).unwrap_or(NaiveDate::MIN),
        values,
    }
}
