//! Small numeric helpers: normal quantiles, empirical quantiles, calendar months.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::ForecastError;

/// Average days per month.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Inverse standard normal CDF (Beasley-Springer-Moro).
///
/// `p` is clamped into `[1e-12, 1 - 1e-12]`.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 4] = [2.50662823884, -18.61500062529, 41.39119773534, -25.44106049637];
    const B: [f64; 4] = [-8.47351093090, 23.08336743743, -21.06224101826, 3.13082909833];
    const C: [f64; 9] = [
        0.3374754822726147,
        0.9761690190917186,
        0.1607979714918209,
        0.0276438810333863,
        0.0038405729373609,
        0.0003951896511919,
        0.0000321767881768,
        0.0000002888167364,
        0.0000003960315187,
    ];

    let p = p.clamp(1e-12, 1.0 - 1e-12);
    let y = p - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let num = A[0] + r * (A[1] + r * (A[2] + r * A[3]));
        let den = 1.0 + r * (B[0] + r * (B[1] + r * (B[2] + r * B[3])));
        return y * num / den;
    }
    let r = if y < 0.0 { p } else { 1.0 - p };
    let s = (-r.ln()).ln();
    let z = C
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * s + c);
    if y < 0.0 {
        -z
    } else {
        z
    }
}

/// Two-sided z multiplier for a confidence level in `(0, 1)`.
pub fn z_for_confidence(confidence: f64) -> Result<f64, ForecastError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ForecastError::InvalidConfidence(confidence));
    }
    Ok(inverse_normal_cdf((1.0 + confidence) / 2.0))
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Fractional months from `from` to `to` (negative if `to` is earlier).
pub fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / (DAYS_PER_MONTH * 86_400.0)
}

/// Absolute month number (`year * 12 + month0`).
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// First day of the month with absolute number `index`.
pub fn month_start(index: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
}
