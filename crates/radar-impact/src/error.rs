//! Impact engine errors.

use radar_core::{RadarError, Scenario, ValidationError};
use thiserror::Error;
use uuid::Uuid;

/// Errors from assessment and the assessment ledger.
#[derive(Error, Debug)]
pub enum ImpactError {
    /// A required input is absent, so no estimate can be made.
    #[error("missing input: {0}")]
    MissingInput(&'static str),

    /// An input record failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Only baseline assessments are stored; scenario runs are ephemeral.
    #[error("only baseline assessments can be recorded, got scenario {}", .0.as_str())]
    ScenarioNotStored(Scenario),

    /// The ledger already holds a record with this ID.
    #[error("assessment {0} already recorded")]
    DuplicateId(Uuid),

    /// Fingerprinting failed.
    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] RadarError),
}
