//! # Custom Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that map JSON and
//! query-string rejections to [`AppError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::AppError;

/// Business-rule checks beyond what deserialization enforces.
pub trait Validate {
    /// Return an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and run its [`Validate`] rules.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract query parameters and run their [`Validate`] rules. Malformed
/// values (a non-numeric `page`, a bad UUID) are validation failures.
pub fn extract_query<T: Validate>(
    result: Result<Query<T>, QueryRejection>,
) -> Result<T, AppError> {
    let Query(value) = result.map_err(|err| AppError::Validation(err.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(String);

    impl Validate for Named {
        fn validate(&self) -> Result<(), String> {
            if self.0.is_empty() {
                Err("name must not be empty".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn validated_json_runs_rules() {
        let ok = extract_validated_json(Ok(Json(Named("x".into()))));
        assert!(ok.is_ok());
        let err = extract_validated_json(Ok(Json(Named(String::new())))).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("empty")));
    }
}
