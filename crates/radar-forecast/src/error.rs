//! Prediction engine errors.

use radar_core::{PredictionType, ValidationError};
use thiserror::Error;
use uuid::Uuid;

/// Errors from fitting, issuing and scoring predictions.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Too few observations to fit the model.
    #[error("insufficient history: need at least {needed} observations, have {got}")]
    InsufficientHistory {
        /// Minimum required.
        needed: usize,
        /// Available.
        got: usize,
    },

    /// Confidence level outside `(0, 1)`.
    #[error("confidence level must be in (0, 1), got {0}")]
    InvalidConfidence(f64),

    /// Horizon outside `1..=120` months.
    #[error("horizon must be between 1 and 120 months, got {0}")]
    InvalidHorizon(u32),

    /// No registered model serves the requested prediction type.
    #[error("no active model serves {}", .0.as_str())]
    NoModel(PredictionType),

    /// Model ID is not registered.
    #[error("model {0} not found")]
    ModelNotFound(Uuid),

    /// Target policy does not exist.
    #[error("policy {0} not found")]
    PolicyNotFound(Uuid),

    /// Enactment timeline requested for a policy that is already enacted.
    #[error("policy {0} is already enacted")]
    AlreadyEnacted(Uuid),

    /// Prediction ID is not in the book.
    #[error("prediction {0} not found")]
    PredictionNotFound(Uuid),

    /// Book already holds a prediction with this ID.
    #[error("prediction {0} already issued")]
    DuplicatePrediction(Uuid),

    /// An outcome was already recorded for the prediction.
    #[error("outcome for prediction {0} already recorded")]
    DuplicateOutcome(Uuid),

    /// Input value is NaN or infinite.
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    /// Input record failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),
}
