//! # Impact Assessment Records
//!
//! An [`ImpactAssessment`] relates one policy to one company within an
//! [`AssessmentPeriod`]. Recomputation never edits a record in place: the
//! new assessment supersedes the old, which stays readable as history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::AssessmentPeriod;

/// Sign of a computed impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ImpactDirection {
    /// Net benefit.
    Positive,
    /// Net cost.
    Negative,
    /// Immaterial.
    Neutral,
    /// Interval spans both gains and losses.
    Mixed,
}

/// Four-level risk classification.
///
/// Ordered by severity, so `RiskLevel::High > RiskLevel::Medium`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Minimal impact expected.
    Low,
    /// Moderate impact expected.
    Medium,
    /// Significant impact expected.
    High,
    /// Severe impact expected.
    Critical,
}

impl RiskLevel {
    /// Every level, lowest first.
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Classify a score in `[0, 1]`.
    ///
    /// Thresholds: `< 0.25` low, `< 0.5` medium, `< 0.75` high, otherwise critical.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            Self::Low
        } else if score < 0.5 {
            Self::Medium
        } else if score < 0.75 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Ordinal score, 1 (low) to 4 (critical).
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Human description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Minimal impact expected",
            Self::Medium => "Moderate impact expected",
            Self::High => "Significant impact expected",
            Self::Critical => "Severe impact expected",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analysis scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Central estimate.
    Baseline,
    /// Favourable outcome.
    Optimistic,
    /// Unfavourable outcome.
    Pessimistic,
    /// Severe outcome.
    WorstCase,
}

impl Scenario {
    /// Every scenario, baseline first.
    pub const ALL: [Scenario; 4] = [
        Self::Baseline,
        Self::Optimistic,
        Self::Pessimistic,
        Self::WorstCase,
    ];

    /// Relative shift applied as `base + |base| * shift`.
    pub fn shift(&self) -> f64 {
        match self {
            Self::Baseline => 0.0,
            Self::Optimistic => 0.4,
            Self::Pessimistic => -0.4,
            Self::WorstCase => -1.0,
        }
    }

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Optimistic => "optimistic",
            Self::Pessimistic => "pessimistic",
            Self::WorstCase => "worst_case",
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::Baseline
    }
}

/// Whether an assessment is the current one for its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Current assessment for its (policy, company, period).
    Active,
    /// Replaced by a later assessment; kept for history.
    Superseded,
}

/// Probability × severity score for one risk factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RiskFactorScore {
    /// `industry` or `regulatory`.
    pub risk_category: String,
    /// Factor name from the taxonomy.
    pub risk_factor: String,
    /// Probability the factor materialises, `[0, 1]`.
    pub probability: f64,
    /// Severity if it does, `[0, 1]`.
    pub severity: f64,
    /// `probability * severity`.
    pub overall: f64,
    /// Level derived from `overall`.
    pub level: RiskLevel,
}

/// Uniqueness key for active assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssessmentKey {
    /// Policy assessed.
    pub policy_id: Uuid,
    /// Company assessed.
    pub company_id: Uuid,
    /// Evaluation period.
    pub period: AssessmentPeriod,
}

/// Computed financial and risk impact of one policy on one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ImpactAssessment {
    /// Assessment ID.
    pub id: Uuid,
    /// Policy assessed.
    pub policy_id: Uuid,
    /// Company assessed.
    pub company_id: Uuid,
    /// When the assessment was computed.
    pub assessment_date: DateTime<Utc>,
    /// Evaluation period.
    pub assessment_period: AssessmentPeriod,
    /// Scenario the figures are computed under.
    pub scenario: Scenario,
    /// Net impact (M USD).
    pub overall_impact: f64,
    /// Sign of the impact.
    pub impact_direction: ImpactDirection,
    /// Confidence in `overall_impact`, `[0, 1]`.
    pub confidence_level: f64,
    /// Lower bound of the impact interval.
    pub confidence_interval_lower: f64,
    /// Upper bound of the impact interval.
    pub confidence_interval_upper: f64,
    /// Revenue component.
    pub revenue_impact: f64,
    /// Cost component.
    pub cost_impact: f64,
    /// Capital component.
    pub capital_impact: f64,
    /// Tax component.
    pub tax_impact: f64,
    /// Overall risk level.
    pub risk_level: RiskLevel,
    /// Overall risk score, `[0, 1]`.
    pub risk_score: f64,
    /// Names of the factors scored.
    pub risk_factors: Vec<String>,
    /// Per-factor scores.
    pub risk_scores: Vec<RiskFactorScore>,
    /// When the policy starts to bite.
    pub implementation_date: Option<DateTime<Utc>>,
    /// Deadline for compliance.
    pub compliance_deadline: Option<DateTime<Utc>>,
    /// Months between implementation and compliance deadline.
    pub transition_period: u32,
    /// Recommended mitigations.
    pub mitigation_strategies: Vec<String>,
    /// Estimated cost of mitigation (M USD).
    pub mitigation_cost: f64,
    /// Expected reduction in impact from mitigation, `[0, 1]`.
    pub mitigation_effectiveness: f64,
    /// One-paragraph narrative.
    pub analysis_summary: String,
    /// Factor values used in the computation.
    pub key_assumptions: BTreeMap<String, f64>,
    /// Overall impact under alternative assumptions.
    pub sensitivity_analysis: BTreeMap<String, f64>,
    /// Engine version that produced the record.
    pub model_version: String,
    /// Digest of the inputs.
    pub input_fingerprint: String,
    /// Active or superseded.
    pub status: AssessmentStatus,
    /// Assessment this one replaced.
    pub supersedes: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time (status changes only).
    pub updated_at: DateTime<Utc>,
}

impl ImpactAssessment {
    /// Uniqueness key.
    pub fn key(&self) -> AssessmentKey {
        AssessmentKey {
            policy_id: self.policy_id,
            company_id: self.company_id,
            period: self.assessment_period.clone(),
        }
    }

    /// Whether this is the active record for its key.
    pub fn is_active(&self) -> bool {
        self.status == AssessmentStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.249), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.75), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn risk_level_ordering_and_ordinals() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        let ordinals: Vec<u8> = RiskLevel::ALL.iter().map(RiskLevel::ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert_eq!(RiskLevel::High.description(), "Significant impact expected");
    }

    #[test]
    fn scenario_shifts() {
        assert_eq!(Scenario::Baseline.shift(), 0.0);
        assert!(Scenario::Optimistic.shift() > 0.0);
        assert!(Scenario::WorstCase.shift() < Scenario::Pessimistic.shift());
        assert_eq!(serde_json::to_string(&Scenario::WorstCase).unwrap(), "\"worst_case\"");
    }
}
