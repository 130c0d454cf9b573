//! # Error Hierarchy
//!
//! Structured error types shared by every PolicyRadar crate, built with
//! `thiserror`. Engine crates wrap [`ValidationError`] in their own error
//! enums; the API layer maps them onto HTTP status codes.

use thiserror::Error;

/// Top-level error type for core operations (settings, dataset I/O).
#[derive(Error, Debug)]
pub enum RadarError {
    /// A record or identifier failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A configuration value could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for domain records and identifier newtypes.
///
/// Each variant carries the offending input so operators can diagnose bad
/// payloads without guesswork.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Jurisdiction code is empty or contains characters outside `[A-Z0-9-]`.
    #[error("invalid jurisdiction code: \"{0}\" (expected 2-10 uppercase letters, digits or '-')")]
    InvalidJurisdiction(String),

    /// Assessment period is not of the form `YYYY-YYYY`.
    #[error(
        "invalid assessment period: \"{0}\" (expected YYYY-YYYY with end >= start, \
         span <= 10 years)"
    )]
    InvalidPeriod(String),

    /// A required text field is empty or whitespace-only.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A bounded numeric field is outside its allowed range.
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the field.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A numeric field is NaN or infinite.
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    /// Dates on a record are out of order.
    #[error("{later} ({later_value}) precedes {earlier} ({earlier_value})")]
    DateOrder {
        /// Field that should come first.
        earlier: &'static str,
        /// Its value.
        earlier_value: String,
        /// Field that should come later.
        later: &'static str,
        /// Its value.
        later_value: String,
    },
}

impl ValidationError {
    /// Check that `value` lies in `[min, max]` and is finite.
    pub fn check_range(
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite(field));
        }
        if value < min || value > max {
            return Err(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
        Ok(())
    }

    /// Check that an optional bounded field, when present, lies in range.
    pub fn check_optional_range(
        field: &'static str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) => Self::check_range(field, v, min, max),
            None => Ok(()),
        }
    }

    /// Check that a required text field is non-blank.
    pub fn check_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField(field));
        }
        Ok(())
    }
}
