//! Evaluation periods for impact assessments (`"2025-2026"`).

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The period an impact assessment covers, written `YYYY-YYYY`.
///
/// At most one assessment per (policy, company) pair is active within a
/// period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(try_from = "String", into = "String")]
pub struct AssessmentPeriod(String);

impl AssessmentPeriod {
    /// Parse and validate a period string.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = value.as_ref().trim();
        let invalid = || ValidationError::InvalidPeriod(raw.to_string());
        let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.len() != 4 {
            return Err(invalid());
        }
        let start: i32 = start.parse().map_err(|_| invalid())?;
        let end: i32 = end.parse().map_err(|_| invalid())?;
        if end < start || end - start > 10 {
            return Err(invalid());
        }
        Ok(Self(format!("{start:04}-{end:04}")))
    }

    /// The one-year period starting in `year`.
    pub fn starting(year: i32) -> Self {
        Self(format!("{:04}-{:04}", year, year + 1))
    }

    /// The one-year period starting in the year of `now`.
    pub fn current(now: DateTime<Utc>) -> Self {
        Self::starting(now.year())
    }

    /// First year of the period.
    pub fn start_year(&self) -> i32 {
        self.0[..4].parse().unwrap_or_default()
    }

    /// Access the period string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssessmentPeriod {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssessmentPeriod> for String {
    fn from(period: AssessmentPeriod) -> Self {
        period.0
    }
}

impl std::fmt::Display for AssessmentPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_valid_period() {
        let p = AssessmentPeriod::new("2025-2026").unwrap();
        assert_eq!(p.as_str(), "2025-2026");
        assert_eq!(p.start_year(), 2025);
    }

    #[test]
    fn rejects_reversed_or_long_periods() {
        assert!(AssessmentPeriod::new("2026-2025").is_err());
        assert!(AssessmentPeriod::new("2000-2020").is_err());
        assert!(AssessmentPeriod::new("25-26").is_err());
        assert!(AssessmentPeriod::new("2025").is_err());
        assert!(AssessmentPeriod::new("abcd-efgh").is_err());
    }

    #[test]
    fn current_period_uses_calendar_year() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap();
        assert_eq!(AssessmentPeriod::current(now).as_str(), "2026-2027");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Spans of up to ten years parse, normalise and survive serde.
        #[test]
        fn short_spans_round_trip(start in 1000i32..9989, span in 0i32..=10) {
            let raw = format!(" {start}-{} ", start + span);
            let period = AssessmentPeriod::new(&raw).unwrap();
            prop_assert_eq!(period.start_year(), start);
            prop_assert_eq!(period.as_str(), raw.trim());
            let json = serde_json::to_string(&period).unwrap();
            let back: AssessmentPeriod = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, period);
        }

        /// Reversed periods and spans over ten years are rejected.
        #[test]
        fn long_or_reversed_spans_rejected(start in 1100i32..8999, gap in 1i32..100) {
            let reversed = format!("{start}-{}", start - gap);
            prop_assert!(AssessmentPeriod::new(&reversed).is_err());
            let long = format!("{start}-{}", start + 10 + gap);
            prop_assert!(AssessmentPeriod::new(&long).is_err());
        }
    }
}
