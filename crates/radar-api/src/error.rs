//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine and validation errors from `radar-core`, `radar-impact` and
//! `radar-forecast` to HTTP status codes with a JSON body of the form
//! `{"error": {"code", "message", "details"?}}`. Internal failures are
//! logged and replaced with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use radar_forecast::ForecastError;
use radar_impact::ImpactError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code (`NOT_FOUND`, `VALIDATION_ERROR`, ...).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional context for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Body with no details.
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Application-level error returned by every handler.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal failure (500). Logged, never returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Persist-after-write failure. The in-memory write already happened.
    pub fn persistence(what: &str, err: sqlx::Error) -> Self {
        Self::Internal(format!("failed to persist {what}: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

impl From<radar_core::ValidationError> for AppError {
    fn from(err: radar_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ImpactError> for AppError {
    fn from(err: ImpactError) -> Self {
        match &err {
            ImpactError::MissingInput(_) | ImpactError::Invalid(_) => {
                Self::Validation(err.to_string())
            }
            ImpactError::ScenarioNotStored(_) => Self::BadRequest(err.to_string()),
            ImpactError::DuplicateId(_) => Self::Conflict(err.to_string()),
            ImpactError::Fingerprint(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match &err {
            ForecastError::PolicyNotFound(_)
            | ForecastError::PredictionNotFound(_)
            | ForecastError::ModelNotFound(_) => Self::NotFound(err.to_string()),
            ForecastError::DuplicatePrediction(_)
            | ForecastError::DuplicateOutcome(_)
            | ForecastError::AlreadyEnacted(_) => Self::Conflict(err.to_string()),
            ForecastError::InsufficientHistory { .. }
            | ForecastError::InvalidConfidence(_)
            | ForecastError::InvalidHorizon(_)
            | ForecastError::NoModel(_)
            | ForecastError::NotFinite(_)
            | ForecastError::Invalid(_) => Self::Validation(err.to_string()),
        }
    }
}
