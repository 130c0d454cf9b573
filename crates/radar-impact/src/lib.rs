//! # radar-impact — Policy Impact Assessment Engine
//!
//! Turns a (policy, company) pair into an [`ImpactAssessment`]: a signed
//! financial impact with a confidence interval, a split across revenue,
//! cost, capital and tax, a risk score with per-factor detail, a compliance
//! timeline and a mitigation estimate.
//!
//! ## Pipeline
//!
//! ```text
//! exposure × status weight × size factor × estimated_impact  → base impact
//! base + |base| × scenario shift                              → overall impact
//! overall × group weights                                     → breakdown
//! confidence → interval → direction → risk score → mitigation
//! ```
//!
//! ## Determinism
//!
//! The engine reads no clock and no randomness. The assessment ID and date
//! come from the caller through [`AssessmentRequest`], so the same inputs and
//! [`ENGINE_MODEL_VERSION`] always yield the same figures and the same
//! [`radar_core::Fingerprint`].
//!
//! [`AssessmentLedger`] sits on top and keeps at most one active
//! assessment per (policy, company, period).
//!
//! [`ImpactAssessment`]: radar_core::ImpactAssessment

pub mod breakdown;
pub mod engine;
pub mod error;
pub mod exposure;
pub mod ledger;
pub mod risk;

#[cfg(test)]
pub(crate) mod fixtures;

pub use breakdown::{GroupWeights, ImpactBreakdown};
pub use engine::{
    AssessmentInput, AssessmentJob, AssessmentRequest, ImpactEngine, ENGINE_MODEL_VERSION,
};
pub use error::ImpactError;
pub use exposure::Exposure;
pub use ledger::{AssessmentLedger, RecordOutcome};
pub use risk::{MitigationPlan, RiskProfile};
