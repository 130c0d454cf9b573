//! # Assessment Ledger
//!
//! Holds every assessment ever recorded and an index from
//! (policy, company, period) to the single active one. Recording never
//! deletes: a changed fingerprint supersedes the active record, and an
//! identical fingerprint writes nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use radar_core::{AssessmentKey, AssessmentStatus, ImpactAssessment, Scenario};
use uuid::Uuid;

use crate::error::ImpactError;

/// Result of [`AssessmentLedger::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First assessment for its key.
    Created {
        /// The new record.
        id: Uuid,
    },
    /// Replaced the previous active record, which is now superseded.
    Superseded {
        /// The new record.
        id: Uuid,
        /// The record it replaced.
        previous: Uuid,
    },
    /// Inputs unchanged; nothing was written.
    Unchanged {
        /// The record that remains active.
        active: Uuid,
    },
}

impl RecordOutcome {
    /// ID of the record that is active after the call.
    pub fn active_id(&self) -> Uuid {
        match *self {
            Self::Created { id } | Self::Superseded { id, .. } => id,
            Self::Unchanged { active } => active,
        }
    }

    /// Whether the ledger changed.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }
}

/// Supersession-aware store of impact assessments.
#[derive(Debug, Default, Clone)]
pub struct AssessmentLedger {
    records: HashMap<Uuid, ImpactAssessment>,
    history: HashMap<AssessmentKey, Vec<Uuid>>,
    active: HashMap<AssessmentKey, Uuid>,
}

impl AssessmentLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records.
    ///
    /// History is ordered by `created_at`. If more than one record for a key
    /// is marked active, the newest wins and the others are demoted; the IDs
    /// of demoted records are returned so the caller can persist the repair.
    pub fn restore(records: Vec<ImpactAssessment>) -> (Self, Vec<Uuid>) {
        let mut ledger = Self::new();
        let mut sorted = records;
        sorted.sort_by_key(|a| (a.created_at, a.id));

        let mut repaired = Vec::new();
        for record in sorted {
            let key = record.key();
            let id = record.id;
            if record.is_active() {
                if let Some(prev) = ledger.active.insert(key.clone(), id) {
                    if let Some(old) = ledger.records.get_mut(&prev) {
                        old.status = AssessmentStatus::Superseded;
                        old.updated_at = record.created_at;
                    }
                    repaired.push(prev);
                }
            }
            ledger.history.entry(key).or_default().push(id);
            ledger.records.insert(id, record);
        }
        if !repaired.is_empty() {
            tracing::warn!(
                count = repaired.len(),
                "demoted duplicate active assessments while restoring ledger"
            );
        }
        (ledger, repaired)
    }

    /// Record a freshly computed baseline assessment.
    pub fn record(
        &mut self,
        mut assessment: ImpactAssessment,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome, ImpactError> {
        if assessment.scenario != Scenario::Baseline {
            return Err(ImpactError::ScenarioNotStored(assessment.scenario));
        }
        if self.records.contains_key(&assessment.id) {
            return Err(ImpactError::DuplicateId(assessment.id));
        }

        let key = assessment.key();
        let id = assessment.id;

        let previous = match self.active.get(&key).and_then(|a| self.records.get_mut(a)) {
            Some(current) if current.input_fingerprint == assessment.input_fingerprint => {
                return Ok(RecordOutcome::Unchanged { active: current.id });
            }
            Some(current) => {
                current.status = AssessmentStatus::Superseded;
                current.updated_at = now;
                Some(current.id)
            }
            None => None,
        };

        assessment.status = AssessmentStatus::Active;
        assessment.supersedes = previous;
        self.active.insert(key.clone(), id);
        self.history.entry(key).or_default().push(id);
        self.records.insert(id, assessment);

        Ok(match previous {
            Some(previous) => RecordOutcome::Superseded { id, previous },
            None => RecordOutcome::Created { id },
        })
    }

    /// Look up any record, active or superseded.
    pub fn get(&self, id: &Uuid) -> Option<&ImpactAssessment> {
        self.records.get(id)
    }

    /// Active record for a key.
    pub fn active(&self, key: &AssessmentKey) -> Option<&ImpactAssessment> {
        self.active.get(key).and_then(|id| self.records.get(id))
    }

    /// Every record for a key, oldest first.
    pub fn history(&self, key: &AssessmentKey) -> Vec<&ImpactAssessment> {
        self.history
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id)).collect())
            .unwrap_or_default()
    }

    /// Active records for a policy.
    pub fn active_for_policy(&self, policy_id: Uuid) -> Vec<&ImpactAssessment> {
        self.active_where(|k| k.policy_id == policy_id)
    }

    /// Active records for a company.
    pub fn active_for_company(&self, company_id: Uuid) -> Vec<&ImpactAssessment> {
        self.active_where(|k| k.company_id == company_id)
    }

    fn active_where(&self, pred: impl Fn(&AssessmentKey) -> bool) -> Vec<&ImpactAssessment> {
        let mut out: Vec<&ImpactAssessment> = self
            .active
            .iter()
            .filter(|(k, _)| pred(k))
            .filter_map(|(_, id)| self.records.get(id))
            .collect();
        out.sort_by_key(|a| (a.assessment_date, a.id));
        out
    }

    /// All active records.
    pub fn all_active(&self) -> Vec<&ImpactAssessment> {
        self.active_where(|_| true)
    }

    /// Every record.
    pub fn iter(&self) -> impl Iterator<Item = &ImpactAssessment> {
        self.records.values()
    }

    /// Number of records, including superseded ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of active records.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
