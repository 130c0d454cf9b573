#![warn(missing_docs)]

//! # radar-core — Foundational Types for PolicyRadar
//!
//! Every other crate in the workspace depends on this one. It carries the
//! record types that flow between ingestion, the impact engine, the
//! prediction engine and the HTTP layer, plus the shared taxonomy and
//! runtime settings. It has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **Validated newtypes at the edges.** [`JurisdictionCode`] and
//!    [`AssessmentPeriod`] can only be constructed from well-formed input,
//!    so the engines never re-check them.
//!
//! 2. **One taxonomy.** Industries, industry risk factors and policy
//!    category groups are defined once in [`taxonomy`]. The engines match
//!    on [`CategoryGroup`] exhaustively.
//!
//! 3. **[`Fingerprint`] is the sole path to input digests.** Recomputation
//!    decisions compare fingerprints, never ad-hoc field diffs.
//!
//! 4. **[`RadarError`] hierarchy.** Structured errors with `thiserror`, no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod company;
pub mod error;
pub mod fingerprint;
pub mod impact;
pub mod jurisdiction;
pub mod market;
pub mod period;
pub mod policy;
pub mod prediction;
pub mod settings;
pub mod taxonomy;

pub use company::{Company, CompanyProfile, FinancialMetrics, RiskTolerance};
pub use error::{RadarError, ValidationError};
pub use fingerprint::Fingerprint;
pub use impact::{
    AssessmentKey, AssessmentStatus, ImpactAssessment, ImpactDirection, RiskFactorScore,
    RiskLevel, Scenario,
};
pub use jurisdiction::JurisdictionCode;
pub use market::{EconomicIndicator, Frequency, MarketData, TradeFlow, TradeType};
pub use period::AssessmentPeriod;
pub use policy::{ChangeType, Policy, PolicyCategory, PolicyChange, PolicyStatus, PolicyType};
pub use prediction::{
    ForecastPoint, ModelType, Prediction, PredictionKey, PredictionModel, PredictionOutcome,
    PredictionStatus, PredictionType,
};
pub use settings::Settings;
pub use taxonomy::CategoryGroup;
