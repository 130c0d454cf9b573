//! # Policy Records
//!
//! Policies are created by ingestion or the API and amended over time.
//! They are never hard-deleted: repeal and expiry are status changes, and
//! every amendment appends a [`PolicyChange`] so trend analysis can replay
//! the full history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::jurisdiction::JurisdictionCode;
use crate::taxonomy::CategoryGroup;

/// Legal instrument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    /// Statute passed by a legislature.
    Legislation,
    /// Rule issued by an agency.
    Regulation,
    /// Executive order.
    ExecutiveOrder,
    /// Non-binding guidance.
    Guidance,
    /// Technical or industry standard.
    Standard,
    /// International or bilateral agreement.
    Agreement,
}

impl PolicyType {
    /// Every policy type, in declaration order.
    pub const ALL: [PolicyType; 6] = [
        Self::Legislation,
        Self::Regulation,
        Self::ExecutiveOrder,
        Self::Guidance,
        Self::Standard,
        Self::Agreement,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legislation => "legislation",
            Self::Regulation => "regulation",
            Self::ExecutiveOrder => "executive_order",
            Self::Guidance => "guidance",
            Self::Standard => "standard",
            Self::Agreement => "agreement",
        }
    }
}

/// Lifecycle status of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Being drafted, not yet public.
    Draft,
    /// Formally proposed.
    Proposed,
    /// Passed into law.
    Enacted,
    /// In force and being applied.
    Implemented,
    /// Enacted and since amended.
    Amended,
    /// Withdrawn.
    Repealed,
    /// Lapsed at its expiration date.
    Expired,
}

impl PolicyStatus {
    /// Every status, in declaration order.
    pub const ALL: [PolicyStatus; 7] = [
        Self::Draft,
        Self::Proposed,
        Self::Enacted,
        Self::Implemented,
        Self::Amended,
        Self::Repealed,
        Self::Expired,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Proposed => "proposed",
            Self::Enacted => "enacted",
            Self::Implemented => "implemented",
            Self::Amended => "amended",
            Self::Repealed => "repealed",
            Self::Expired => "expired",
        }
    }

    /// Whether the policy is no longer in force.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Repealed | Self::Expired)
    }

    /// Whether the policy is currently binding.
    pub fn is_in_force(&self) -> bool {
        matches!(self, Self::Enacted | Self::Implemented | Self::Amended)
    }

    /// Whether a policy in this status may be moved to `next`. Repealed and
    /// expired policies keep their status.
    pub fn can_move_to(&self, next: PolicyStatus) -> bool {
        !self.is_terminal() || *self == next
    }
}

impl std::fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change recorded against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Substantive text change.
    Amendment,
    /// Withdrawal.
    Repeal,
    /// Term or deadline extended.
    Extension,
    /// Parameter change (rates, thresholds).
    Modification,
    /// Interpretive clarification.
    Clarification,
}

impl ChangeType {
    /// Every change type, in declaration order.
    pub const ALL: [ChangeType; 5] = [
        Self::Amendment,
        Self::Repeal,
        Self::Extension,
        Self::Modification,
        Self::Clarification,
    ];
}

/// A policy category, optionally nested under a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyCategory {
    /// Category ID.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Parent category, if nested.
    pub parent_category_id: Option<Uuid>,
    /// Policy family used by the impact engine.
    pub group: CategoryGroup,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A tracked government policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Policy {
    /// Policy ID.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// Unique registry number, e.g. `US-TRA-0001`.
    pub policy_number: String,
    /// Issuing jurisdiction.
    pub jurisdiction: JurisdictionCode,
    /// Instrument type.
    pub policy_type: PolicyType,
    /// Lifecycle status.
    pub status: PolicyStatus,
    /// Date first proposed.
    pub proposed_date: Option<DateTime<Utc>>,
    /// Date enacted.
    pub enacted_date: Option<DateTime<Utc>>,
    /// Date the policy takes effect.
    pub effective_date: Option<DateTime<Utc>>,
    /// Date the policy lapses.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Issuing regulatory body.
    pub regulatory_body: Option<String>,
    /// Legal authority the policy is issued under.
    pub authority: Option<String>,
    /// Summary of the policy text.
    pub content_summary: Option<String>,
    /// Link to the full text.
    pub full_text_url: Option<String>,
    /// Link to the source announcement.
    pub source_url: Option<String>,
    /// Estimated economy-wide impact in millions of USD (negative = cost).
    pub estimated_impact: Option<f64>,
    /// Confidence in `estimated_impact`, in `[0, 1]`.
    pub impact_confidence: Option<f64>,
    /// Industry slugs the policy targets. Empty means economy-wide.
    #[serde(default)]
    pub affected_industries: Vec<String>,
    /// Category, if classified.
    pub category_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Estimated impact below which a policy is flagged high-risk (M USD).
pub const HIGH_RISK_IMPACT_THRESHOLD: f64 = -100.0;

/// Impact confidence below which a policy is flagged high-risk.
pub const HIGH_RISK_CONFIDENCE_THRESHOLD: f64 = 0.6;

impl Policy {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_empty("title", &self.title)?;
        ValidationError::check_non_empty("policy_number", &self.policy_number)?;
        ValidationError::check_optional_range(
            "impact_confidence",
            self.impact_confidence,
            0.0,
            1.0,
        )?;
        if let Some(impact) = self.estimated_impact {
            if !impact.is_finite() {
                return Err(ValidationError::NotFinite("estimated_impact"));
            }
        }
        check_order("proposed_date", self.proposed_date, "enacted_date", self.enacted_date)?;
        check_order(
            "effective_date",
            self.effective_date,
            "expiration_date",
            self.expiration_date,
        )?;
        Ok(())
    }

    /// Whether the policy carries a large expected cost or an unreliable estimate.
    pub fn is_high_risk(&self) -> bool {
        self.estimated_impact
            .is_some_and(|i| i < HIGH_RISK_IMPACT_THRESHOLD)
            || self
                .impact_confidence
                .is_some_and(|c| c < HIGH_RISK_CONFIDENCE_THRESHOLD)
    }

    /// Whether the policy targets `industry` (economy-wide policies target all).
    pub fn affects_industry(&self, industry: &str) -> bool {
        self.affected_industries.is_empty()
            || self.affected_industries.iter().any(|i| i == industry)
    }

    /// Case-insensitive substring match over title, description and summary.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        hit(&self.title)
            || self.description.as_deref().is_some_and(hit)
            || self.content_summary.as_deref().is_some_and(hit)
    }

    /// Reference date for time-series bucketing: proposal, else creation.
    pub fn reference_date(&self) -> DateTime<Utc> {
        self.proposed_date.unwrap_or(self.created_at)
    }
}

fn check_order(
    earlier: &'static str,
    earlier_value: Option<DateTime<Utc>>,
    later: &'static str,
    later_value: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(a), Some(b)) = (earlier_value, later_value) {
        if b < a {
            return Err(ValidationError::DateOrder {
                earlier,
                earlier_value: a.to_rfc3339(),
                later,
                later_value: b.to_rfc3339(),
            });
        }
    }
    Ok(())
}

/// One recorded change to a policy. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PolicyChange {
    /// Change ID.
    pub id: Uuid,
    /// Policy the change applies to.
    pub policy_id: Uuid,
    /// Kind of change.
    pub change_type: ChangeType,
    /// When the change took effect.
    pub change_date: DateTime<Utc>,
    /// What changed.
    pub change_description: Option<String>,
    /// Signed magnitude in `[-1, 1]`.
    pub impact_magnitude: Option<f64>,
    /// `positive`, `negative` or `neutral`.
    pub impact_direction: Option<String>,
    /// Source document reference.
    pub source_document: Option<String>,
    /// Legislative session the change came from.
    pub legislative_session: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl PolicyChange {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_optional_range("impact_magnitude", self.impact_magnitude, -1.0, 1.0)
    }
}
