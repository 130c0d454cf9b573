//! Generator configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Dataset size, date range and seed.
///
/// The same configuration always produces the same dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// RNG seed.
    pub seed: u64,
    /// Number of policies.
    pub policies: usize,
    /// Number of companies.
    pub companies: usize,
    /// Trading days of prices per symbol.
    pub market_days: usize,
    /// First date of the generated range.
    pub start: NaiveDate,
    /// Last date of the generated range.
    pub end: NaiveDate,
    /// Companies assessed per policy, at most.
    pub max_companies_per_policy: usize,
    /// Worker threads for the assessment run.
    pub workers: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            policies: 1000,
            companies: 500,
            market_days: 1000,
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MIN),
            max_companies_per_policy: 5,
            workers: 4,
        }
    }
}

impl GeneratorConfig {
    /// Check that the range is ordered and counts are usable.
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.end <= self.start {
            return Err(SynthError::InvalidConfig(format!(
                "end {} must be after start {}",
                self.end, self.start
            )));
        }
        if self.workers == 0 {
            return Err(SynthError::InvalidConfig("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Days in the range.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = GeneratorConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.span_days(), 4017);
    }

    #[test]
    fn reversed_range_rejected() {
        let c = GeneratorConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(c.validate(), Err(SynthError::InvalidConfig(_))));
    }
}
