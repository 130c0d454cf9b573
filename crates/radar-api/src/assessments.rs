//! # Assessment Orchestration
//!
//! Bridges the HTTP layer and the impact engine:
//!
//! - resolves (policy, company) pairs from the registries, including the
//!   company profile, latest financial metrics and the policy's category
//!   group;
//! - runs the engine off the async executor;
//! - records results in the [`AssessmentLedger`](radar_impact::AssessmentLedger),
//!   which decides between create, supersede and no-op;
//! - writes new and superseded records through and clears the analytics
//!   cache.
//!
//! Recomputation after a policy or company update re-runs every active
//! assessment that references the changed entity, in its original period.

use chrono::{DateTime, Utc};
use radar_core::{
    AssessmentPeriod, CategoryGroup, Company, CompanyProfile, FinancialMetrics, ImpactAssessment,
    Policy, Scenario,
};
use radar_impact::{
    AssessmentInput, AssessmentJob, AssessmentRequest, ImpactError, RecordOutcome,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Everything the engine reads for one (policy, company) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentPair {
    pub policy: Policy,
    pub group: CategoryGroup,
    pub company: Company,
    pub profile: Option<CompanyProfile>,
    pub metrics: Option<FinancialMetrics>,
}

impl AssessmentPair {
    /// Borrowed engine input.
    pub fn input(&self) -> AssessmentInput<'_> {
        AssessmentInput::new(&self.policy, self.group, &self.company)
            .with_profile(self.profile.as_ref())
            .with_metrics(self.metrics.as_ref())
    }
}

/// A ledger write as reported to API callers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordedAssessment {
    /// `created`, `superseded` or `unchanged`.
    pub outcome: String,
    /// The assessment active after the call.
    pub assessment: ImpactAssessment,
}

/// Result of assessing many pairs.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BatchSummary {
    pub created: usize,
    pub superseded: usize,
    pub unchanged: usize,
    /// Pairs the engine rejected (missing inputs).
    pub skipped: usize,
    pub assessments: Vec<ImpactAssessment>,
}

fn outcome_label(outcome: &RecordOutcome) -> &'static str {
    match outcome {
        RecordOutcome::Created { .. } => "created",
        RecordOutcome::Superseded { .. } => "superseded",
        RecordOutcome::Unchanged { .. } => "unchanged",
    }
}

// ── Pair resolution ─────────────────────────────────────────────────

/// Resolve a pair from an already-loaded policy and company.
pub fn pair_for(state: &AppState, policy: Policy, company: Company) -> AssessmentPair {
    let group = state.group_of(&policy);
    let profile = state.profiles.get(&company.id);
    let metrics = state.latest_metrics(company.id);
    AssessmentPair {
        policy,
        group,
        company,
        profile,
        metrics,
    }
}

/// Resolve a pair by IDs. Unknown IDs are 404.
pub fn resolve_pair(
    state: &AppState,
    policy_id: Uuid,
    company_id: Uuid,
) -> Result<AssessmentPair, AppError> {
    let policy = state
        .policies
        .get(&policy_id)
        .ok_or_else(|| AppError::NotFound(format!("policy {policy_id} not found")))?;
    let company = state
        .companies
        .get(&company_id)
        .ok_or_else(|| AppError::NotFound(format!("company {company_id} not found")))?;
    Ok(pair_for(state, policy, company))
}

/// Companies in the policy's affected industries that are headquartered in
/// or operate in its jurisdiction, by name.
pub fn reached_companies(state: &AppState, policy: &Policy) -> Vec<Company> {
    let jurisdiction = policy.jurisdiction.as_str();
    let mut companies = state.companies.filter(|c| {
        policy.affects_industry(&c.industry)
            && (c.headquarters_country.eq_ignore_ascii_case(jurisdiction)
                || c.has_presence_in(jurisdiction))
    });
    companies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    companies
}

// ── Engine runs ─────────────────────────────────────────────────────

type Job = (AssessmentPair, AssessmentRequest);

/// An engine result with the inputs and request it was computed from.
#[derive(Debug, Clone)]
struct Computed {
    pair: AssessmentPair,
    request: AssessmentRequest,
    assessment: ImpactAssessment,
}

/// Run the engine over `jobs` on the blocking pool. Results keep job order.
async fn run_batch(
    state: &AppState,
    jobs: Vec<Job>,
) -> Result<Vec<(Job, Result<ImpactAssessment, ImpactError>)>, AppError> {
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || {
        let results = {
            let batch: Vec<AssessmentJob<'_>> = jobs
                .iter()
                .map(|(pair, request)| AssessmentJob {
                    input: pair.input(),
                    request: request.clone(),
                })
                .collect();
            engine.assess_batch(&batch)
        };
        jobs.into_iter().zip(results).collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(format!("assessment worker failed: {e}")))
}

/// Compute an assessment under `scenario` without recording it.
pub fn preview(
    state: &AppState,
    pair: &AssessmentPair,
    scenario: Scenario,
    period: AssessmentPeriod,
    now: DateTime<Utc>,
) -> Result<ImpactAssessment, AppError> {
    let request = AssessmentRequest::baseline(period, now).with_scenario(scenario);
    Ok(state.engine.assess(&pair.input(), &request)?)
}

// ── Ledger writes ───────────────────────────────────────────────────

/// Current inputs for `pair`, or `None` once its policy or company is gone.
fn current_pair(state: &AppState, pair: &AssessmentPair) -> Option<AssessmentPair> {
    let policy = state.policies.get(&pair.policy.id)?;
    let company = state.companies.get(&pair.company.id)?;
    Some(pair_for(state, policy, company))
}

/// Ledger rows written by [`record_all`], plus results it had to drop.
struct Recorded {
    rows: Vec<(RecordOutcome, ImpactAssessment)>,
    dropped: usize,
}

/// Record baseline assessments, then persist every changed row.
///
/// Inputs are re-read under the ledger write lock. A result computed from
/// inputs that have changed since is recomputed from the current ones
/// before it is recorded, so it can never supersede a fresher assessment
/// with stale figures. A result whose policy or company has disappeared,
/// or whose current inputs the engine rejects, is dropped and the prior
/// record stays active.
async fn record_all(
    state: &AppState,
    computed: Vec<Computed>,
    now: DateTime<Utc>,
) -> Result<Recorded, AppError> {
    let mut recorded = Vec::with_capacity(computed.len());
    let mut dropped = 0;
    let mut changed = Vec::new();
    {
        let mut ledger = state.ledger.write();
        for Computed { pair, request, assessment } in computed {
            let assessment = match current_pair(state, &pair) {
                Some(current) if current == pair => assessment,
                Some(current) => match state.engine.assess(&current.input(), &request) {
                    Ok(fresh) => {
                        tracing::debug!(
                            policy_id = %pair.policy.id,
                            company_id = %pair.company.id,
                            "inputs changed while assessing, recomputed"
                        );
                        fresh
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "current inputs rejected, keeping prior record");
                        dropped += 1;
                        continue;
                    }
                },
                None => {
                    dropped += 1;
                    continue;
                }
            };
            let outcome = ledger.record(assessment, now)?;
            let active = ledger.get(&outcome.active_id()).cloned().ok_or_else(|| {
                AppError::Internal(format!("ledger lost assessment {}", outcome.active_id()))
            })?;
            if let RecordOutcome::Superseded { previous, .. } = outcome {
                if let Some(old) = ledger.get(&previous) {
                    changed.push(old.clone());
                }
            }
            if outcome.is_write() {
                changed.push(active.clone());
            }
            recorded.push((outcome, active));
        }
    }

    if !changed.is_empty() {
        state.persist_all(&changed).await?;
        state.invalidate_caches();
    }
    Ok(Recorded {
        rows: recorded,
        dropped,
    })
}

/// Assess one pair in `period` and record the baseline result.
pub async fn assess_pair(
    state: &AppState,
    policy_id: Uuid,
    company_id: Uuid,
    period: AssessmentPeriod,
    now: DateTime<Utc>,
) -> Result<RecordedAssessment, AppError> {
    let pair = resolve_pair(state, policy_id, company_id)?;
    let request = AssessmentRequest::baseline(period, now);
    let assessment = state.engine.assess(&pair.input(), &request)?;
    let computed = Computed {
        pair,
        request,
        assessment,
    };
    let mut recorded = record_all(state, vec![computed], now).await?;
    let (outcome, assessment) = recorded.rows.pop().ok_or_else(|| {
        AppError::Conflict(format!(
            "policy {policy_id} or company {company_id} changed and can no longer be assessed"
        ))
    })?;

    tracing::info!(
        %policy_id,
        %company_id,
        outcome = outcome_label(&outcome),
        risk_level = assessment.risk_level.as_str(),
        "Assessed policy impact"
    );
    Ok(RecordedAssessment {
        outcome: outcome_label(&outcome).to_string(),
        assessment,
    })
}

/// Assess a policy against every company in its affected industries that
/// operates in the policy's jurisdiction.
pub async fn assess_policy(
    state: &AppState,
    policy_id: Uuid,
    period: AssessmentPeriod,
    now: DateTime<Utc>,
) -> Result<BatchSummary, AppError> {
    let policy = state
        .policies
        .get(&policy_id)
        .ok_or_else(|| AppError::NotFound(format!("policy {policy_id} not found")))?;
    let jobs = reached_companies(state, &policy)
        .into_iter()
        .map(|company| {
            let request = AssessmentRequest::baseline(period.clone(), now);
            (pair_for(state, policy.clone(), company), request)
        })
        .collect();
    let summary = record_batch(state, run_batch(state, jobs).await?, now).await?;

    tracing::info!(
        %policy_id,
        created = summary.created,
        superseded = summary.superseded,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        "Assessed policy across companies"
    );
    Ok(summary)
}

async fn record_batch(
    state: &AppState,
    results: Vec<(Job, Result<ImpactAssessment, ImpactError>)>,
    now: DateTime<Utc>,
) -> Result<BatchSummary, AppError> {
    let mut summary = BatchSummary::default();
    let mut computed = Vec::new();
    for ((pair, request), result) in results {
        match result {
            Ok(assessment) => computed.push(Computed {
                pair,
                request,
                assessment,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "skipping pair the engine rejected");
                summary.skipped += 1;
            }
        }
    }
    let recorded = record_all(state, computed, now).await?;
    summary.skipped += recorded.dropped;
    for (outcome, assessment) in recorded.rows {
        match outcome {
            RecordOutcome::Created { .. } => summary.created += 1,
            RecordOutcome::Superseded { .. } => summary.superseded += 1,
            RecordOutcome::Unchanged { .. } => summary.unchanged += 1,
        }
        summary.assessments.push(assessment);
    }
    Ok(summary)
}

// ── Recomputation ───────────────────────────────────────────────────

/// Re-run every active assessment that references `policy_id`.
pub async fn reassess_policy(
    state: &AppState,
    policy_id: Uuid,
    now: DateTime<Utc>,
) -> Result<BatchSummary, AppError> {
    let keys: Vec<(Uuid, AssessmentPeriod)> = state
        .ledger
        .read()
        .active_for_policy(policy_id)
        .into_iter()
        .map(|a| (a.company_id, a.assessment_period.clone()))
        .collect();
    let Some(policy) = state.policies.get(&policy_id) else {
        return Ok(BatchSummary::default());
    };

    let jobs = keys
        .into_iter()
        .filter_map(|(company_id, period)| {
            let company = state.companies.get(&company_id)?;
            let request = AssessmentRequest::baseline(period, now);
            Some((pair_for(state, policy.clone(), company), request))
        })
        .collect();
    let summary = record_batch(state, run_batch(state, jobs).await?, now).await?;
    log_recompute("policy", policy_id, &summary);
    Ok(summary)
}

/// Re-run every active assessment that references `company_id`.
pub async fn reassess_company(
    state: &AppState,
    company_id: Uuid,
    now: DateTime<Utc>,
) -> Result<BatchSummary, AppError> {
    let keys: Vec<(Uuid, AssessmentPeriod)> = state
        .ledger
        .read()
        .active_for_company(company_id)
        .into_iter()
        .map(|a| (a.policy_id, a.assessment_period.clone()))
        .collect();
    let Some(company) = state.companies.get(&company_id) else {
        return Ok(BatchSummary::default());
    };

    let jobs = keys
        .into_iter()
        .filter_map(|(policy_id, period)| {
            let policy = state.policies.get(&policy_id)?;
            let request = AssessmentRequest::baseline(period, now);
            Some((pair_for(state, policy, company.clone()), request))
        })
        .collect();
    let summary = record_batch(state, run_batch(state, jobs).await?, now).await?;
    log_recompute("company", company_id, &summary);
    Ok(summary)
}

fn log_recompute(entity: &'static str, id: Uuid, summary: &BatchSummary) {
    if summary.superseded > 0 || summary.skipped > 0 {
        tracing::info!(
            entity,
            %id,
            superseded = summary.superseded,
            unchanged = summary.unchanged,
            skipped = summary.skipped,
            "Recomputed active assessments"
        );
    }
}
