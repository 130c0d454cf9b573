//! # Analytics API
//!
//! Scenario analysis runs the engine under every scenario without storing
//! the results. Trends and risk analysis are pure functions of the stores
//! and are served through the response cache.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use radar_core::{
    AssessmentPeriod, Company, ImpactAssessment, ImpactDirection, Policy, RiskLevel, Scenario,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::assessments::{self, AssessmentPair};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::ApiResponse;
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/analytics/scenario", post(scenario_analysis))
        .route("/api/v1/analytics/trends", get(trends))
        .route("/api/v1/analytics/risk-analysis", get(risk_analysis))
}

const MAX_SCENARIO_COMPANIES: usize = 500;

// ---------------------------------------------------------------------------
// Shared aggregates
// ---------------------------------------------------------------------------

/// Count per risk level. Every level is present, zero when unused.
pub fn risk_distribution<'a>(
    assessments: impl IntoIterator<Item = &'a ImpactAssessment>,
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = RiskLevel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    for a in assessments {
        *counts.entry(a.risk_level.as_str().to_string()).or_default() += 1;
    }
    counts
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Scenario analysis
// ---------------------------------------------------------------------------

/// Request for `POST /api/v1/analytics/scenario`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScenarioRequest {
    pub policy_id: Uuid,
    /// Companies to evaluate. Defaults to every company the policy reaches.
    pub company_ids: Option<Vec<Uuid>>,
    /// Scenarios to run. Defaults to all of them.
    pub scenarios: Option<Vec<Scenario>>,
    /// Evaluation period, `YYYY-YYYY`. Defaults to the current year.
    pub period: Option<String>,
}

impl Validate for ScenarioRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(ids) = &self.company_ids {
            if ids.is_empty() {
                return Err("company_ids must not be empty when given".to_string());
            }
            if ids.len() > MAX_SCENARIO_COMPANIES {
                return Err(format!(
                    "at most {MAX_SCENARIO_COMPANIES} companies per scenario analysis"
                ));
            }
        }
        if let Some(s) = &self.scenarios {
            if s.is_empty() {
                return Err("scenarios must not be empty when given".to_string());
            }
        }
        if let Some(p) = &self.period {
            AssessmentPeriod::new(p).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

/// One company's figures under one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyScenarioImpact {
    pub company_id: Uuid,
    pub company_name: String,
    pub overall_impact: f64,
    pub confidence_interval_lower: f64,
    pub confidence_interval_upper: f64,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
}

/// Aggregate for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    /// Sum of `overall_impact` over the evaluated companies (M USD).
    pub total_impact: f64,
    pub average_impact: Option<f64>,
    pub average_risk_score: Option<f64>,
    pub risk_distribution: BTreeMap<String, usize>,
    /// Per-company figures, most negative first.
    pub impacts: Vec<CompanyScenarioImpact>,
}

/// Scenario analysis result. Nothing here is stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScenarioAnalysis {
    pub policy_id: Uuid,
    pub period: AssessmentPeriod,
    /// Companies evaluated under every scenario.
    pub companies: usize,
    /// Companies the engine could not assess.
    pub skipped: usize,
    pub scenarios: Vec<ScenarioOutcome>,
}

/// Evaluate `pairs` under each scenario. A company the engine rejects under
/// any scenario is skipped for all of them.
pub fn evaluate_scenarios(
    state: &AppState,
    policy_id: Uuid,
    pairs: &[AssessmentPair],
    scenarios: &[Scenario],
    period: AssessmentPeriod,
    now: DateTime<Utc>,
) -> ScenarioAnalysis {
    let mut per_scenario: Vec<Vec<ImpactAssessment>> = vec![Vec::new(); scenarios.len()];
    let mut names = HashMap::new();
    let mut skipped = 0;

    for pair in pairs {
        let runs: Result<Vec<ImpactAssessment>, AppError> = scenarios
            .iter()
            .map(|s| assessments::preview(state, pair, *s, period.clone(), now))
            .collect();
        match runs {
            Ok(runs) => {
                names.insert(pair.company.id, pair.company.name.clone());
                for (slot, a) in per_scenario.iter_mut().zip(runs) {
                    slot.push(a);
                }
            }
            Err(e) => {
                tracing::debug!(company_id = %pair.company.id, error = %e, "scenario run skipped");
                skipped += 1;
            }
        }
    }

    let companies = pairs.len() - skipped;
    let outcomes = scenarios
        .iter()
        .zip(per_scenario)
        .map(|(scenario, runs)| {
            let mut impacts: Vec<CompanyScenarioImpact> = runs
                .iter()
                .map(|a| CompanyScenarioImpact {
                    company_id: a.company_id,
                    company_name: names.get(&a.company_id).cloned().unwrap_or_default(),
                    overall_impact: a.overall_impact,
                    confidence_interval_lower: a.confidence_interval_lower,
                    confidence_interval_upper: a.confidence_interval_upper,
                    risk_level: a.risk_level,
                    risk_score: a.risk_score,
                })
                .collect();
            impacts.sort_by(|a, b| {
                a.overall_impact
                    .total_cmp(&b.overall_impact)
                    .then_with(|| a.company_name.cmp(&b.company_name))
            });
            ScenarioOutcome {
                scenario: *scenario,
                total_impact: runs.iter().map(|a| a.overall_impact).sum(),
                average_impact: mean(runs.iter().map(|a| a.overall_impact)),
                average_risk_score: mean(runs.iter().map(|a| a.risk_score)),
                risk_distribution: risk_distribution(&runs),
                impacts,
            }
        })
        .collect();

    ScenarioAnalysis {
        policy_id,
        period,
        companies,
        skipped,
        scenarios: outcomes,
    }
}

/// POST /api/v1/analytics/scenario — Per-scenario impacts for a policy.
#[utoipa::path(
    post,
    path = "/api/v1/analytics/scenario",
    request_body = ScenarioRequest,
    responses(
        (status = 200, description = "Scenario comparison (data)", body = ScenarioAnalysis),
        (status = 404, description = "Policy or company not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "analytics"
)]
async fn scenario_analysis(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ScenarioRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ScenarioAnalysis>>, AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let policy = state
        .policies
        .get(&req.policy_id)
        .ok_or_else(|| AppError::NotFound(format!("policy {} not found", req.policy_id)))?;
    let companies: Vec<Company> = match &req.company_ids {
        Some(ids) => ids
            .iter()
            .map(|id| {
                state
                    .companies
                    .get(id)
                    .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))
            })
            .collect::<Result<_, _>>()?,
        None => assessments::reached_companies(&state, &policy)
            .into_iter()
            .take(MAX_SCENARIO_COMPANIES)
            .collect(),
    };
    let pairs: Vec<AssessmentPair> = companies
        .into_iter()
        .map(|c| assessments::pair_for(&state, policy.clone(), c))
        .collect();
    let scenarios = req.scenarios.unwrap_or_else(|| Scenario::ALL.to_vec());
    let period = match &req.period {
        Some(p) => AssessmentPeriod::new(p)?,
        None => AssessmentPeriod::current(Utc::now()),
    };

    let worker_state = state.clone();
    let policy_id = policy.id;
    let analysis = tokio::task::spawn_blocking(move || {
        evaluate_scenarios(&worker_state, policy_id, &pairs, &scenarios, period, Utc::now())
    })
    .await
    .map_err(|e| AppError::Internal(format!("scenario worker failed: {e}")))?;

    tracing::info!(
        %policy_id,
        companies = analysis.companies,
        skipped = analysis.skipped,
        scenarios = analysis.scenarios.len(),
        "Scenario analysis computed"
    );
    Ok(Json(ApiResponse::ok(analysis)))
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

/// Query for `GET /api/v1/analytics/trends`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendsQuery {
    /// Months to cover, ending with the current month, 1..=120 (default 12).
    pub months: Option<u32>,
    /// Restrict to one jurisdiction.
    pub jurisdiction: Option<String>,
    /// Restrict to policies affecting one industry.
    pub industry: Option<String>,
}

impl Validate for TrendsQuery {
    fn validate(&self) -> Result<(), String> {
        match self.months {
            Some(m) if !(1..=120).contains(&m) => {
                Err("months must be between 1 and 120".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Monthly policy activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PolicyTrends {
    /// Policies proposed in the month.
    pub proposed: Vec<usize>,
    /// Policies enacted in the month.
    pub enacted: Vec<usize>,
    /// Sum of `estimated_impact` over policies proposed in the month.
    pub estimated_impact: Vec<f64>,
}

/// Monthly assessment activity (active assessments by assessment date).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImpactTrends {
    pub assessments: Vec<usize>,
    pub average_impact: Vec<Option<f64>>,
    pub positive: Vec<usize>,
    pub negative: Vec<usize>,
}

/// Monthly risk mix of active assessments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RiskTrends {
    pub low: Vec<usize>,
    pub medium: Vec<usize>,
    pub high: Vec<usize>,
    pub critical: Vec<usize>,
}

/// Monthly trends. Every vector is aligned with `months`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendsReport {
    /// `YYYY-MM`, oldest first.
    pub months: Vec<String>,
    pub policy_trends: PolicyTrends,
    pub impact_trends: ImpactTrends,
    pub risk_trends: RiskTrends,
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// Bucket policies and active assessments into the `months` months ending
/// with the month of `now`.
pub fn compute_trends(
    policies: &[Policy],
    assessments: &[ImpactAssessment],
    months: u32,
    now: DateTime<Utc>,
) -> TrendsReport {
    let n = months as usize;
    let last = month_index(now.date_naive());
    let first = last - months as i32 + 1;
    let slot = |date: DateTime<Utc>| -> Option<usize> {
        let i = month_index(date.date_naive());
        (first..=last).contains(&i).then(|| (i - first) as usize)
    };

    let mut policy_trends = PolicyTrends {
        proposed: vec![0; n],
        enacted: vec![0; n],
        estimated_impact: vec![0.0; n],
    };
    for p in policies {
        if let Some(i) = slot(p.reference_date()) {
            policy_trends.proposed[i] += 1;
            policy_trends.estimated_impact[i] += p.estimated_impact.unwrap_or(0.0);
        }
        if let Some(i) = p.enacted_date.and_then(slot) {
            policy_trends.enacted[i] += 1;
        }
    }

    let mut sums = vec![0.0; n];
    let mut impact_trends = ImpactTrends {
        assessments: vec![0; n],
        average_impact: vec![None; n],
        positive: vec![0; n],
        negative: vec![0; n],
    };
    let mut risk_trends = RiskTrends {
        low: vec![0; n],
        medium: vec![0; n],
        high: vec![0; n],
        critical: vec![0; n],
    };
    for a in assessments.iter().filter(|a| a.is_active()) {
        let Some(i) = slot(a.assessment_date) else {
            continue;
        };
        impact_trends.assessments[i] += 1;
        sums[i] += a.overall_impact;
        match a.impact_direction {
            ImpactDirection::Positive => impact_trends.positive[i] += 1,
            ImpactDirection::Negative => impact_trends.negative[i] += 1,
            ImpactDirection::Neutral | ImpactDirection::Mixed => {}
        }
        let bucket = match a.risk_level {
            RiskLevel::Low => &mut risk_trends.low,
            RiskLevel::Medium => &mut risk_trends.medium,
            RiskLevel::High => &mut risk_trends.high,
            RiskLevel::Critical => &mut risk_trends.critical,
        };
        bucket[i] += 1;
    }
    for i in 0..n {
        let count = impact_trends.assessments[i];
        if count > 0 {
            impact_trends.average_impact[i] = Some(sums[i] / count as f64);
        }
    }

    TrendsReport {
        months: (first..=last).map(month_label).collect(),
        policy_trends,
        impact_trends,
        risk_trends,
    }
}

/// GET /api/v1/analytics/trends — Monthly policy, impact and risk trends.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/trends",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Monthly trends (data)", body = TrendsReport),
        (status = 422, description = "Invalid window", body = crate::error::ErrorBody),
    ),
    tag = "analytics"
)]
async fn trends(
    State(state): State<AppState>,
    query: Result<Query<TrendsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let q = extract_query(query)?;
    let months = q.months.unwrap_or(12);
    let key = format!(
        "analytics:trends:{months}:{}:{}",
        q.jurisdiction.as_deref().unwrap_or("*").to_ascii_uppercase(),
        q.industry.as_deref().unwrap_or("*").to_ascii_lowercase()
    );

    let report = state
        .cache
        .get_or_compute(key, || async {
            let policies = state.policies.filter(|p| {
                q.jurisdiction
                    .as_deref()
                    .map_or(true, |j| p.jurisdiction.matches(j))
                    && q.industry.as_deref().map_or(true, |i| p.affects_industry(i))
            });
            let selected: HashSet<Uuid> = policies.iter().map(|p| p.id).collect();
            let filtered = q.jurisdiction.is_some() || q.industry.is_some();
            let assessments: Vec<ImpactAssessment> = state
                .ledger
                .read()
                .all_active()
                .into_iter()
                .filter(|a| !filtered || selected.contains(&a.policy_id))
                .cloned()
                .collect();
            Ok::<_, AppError>(compute_trends(&policies, &assessments, months, Utc::now()))
        })
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}

// ---------------------------------------------------------------------------
// Risk analysis
// ---------------------------------------------------------------------------

/// Query for `GET /api/v1/analytics/risk-analysis`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RiskAnalysisQuery {
    /// Number of top exposures, 1..=100 (default 10).
    pub top: Option<usize>,
}

impl Validate for RiskAnalysisQuery {
    fn validate(&self) -> Result<(), String> {
        match self.top {
            Some(t) if !(1..=100).contains(&t) => Err("top must be between 1 and 100".to_string()),
            _ => Ok(()),
        }
    }
}

/// Risk aggregate for one group of active assessments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RiskGroup {
    /// Industry slug or jurisdiction code.
    pub name: String,
    pub assessments: usize,
    pub average_risk_score: f64,
    /// Sum of `overall_impact` (M USD).
    pub total_impact: f64,
    /// Assessments rated high or critical.
    pub elevated: usize,
}

/// One of the highest-risk active assessments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RiskExposure {
    pub assessment_id: Uuid,
    pub policy_id: Uuid,
    pub policy_title: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub overall_impact: f64,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
}

/// Portfolio-wide risk picture over active assessments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RiskAnalysis {
    pub total_assessments: usize,
    pub average_risk_score: Option<f64>,
    pub risk_distribution: BTreeMap<String, usize>,
    /// By company industry, highest average risk first.
    pub by_industry: Vec<RiskGroup>,
    /// By policy jurisdiction, highest average risk first.
    pub by_jurisdiction: Vec<RiskGroup>,
    /// Highest risk score first.
    pub top_exposures: Vec<RiskExposure>,
}

fn group_risk<'a>(
    assessments: &[&'a ImpactAssessment],
    key: impl Fn(&ImpactAssessment) -> Option<String>,
) -> Vec<RiskGroup> {
    let mut groups: BTreeMap<String, Vec<&'a ImpactAssessment>> = BTreeMap::new();
    for &a in assessments {
        if let Some(k) = key(a) {
            groups.entry(k).or_default().push(a);
        }
    }
    let mut out: Vec<RiskGroup> = groups
        .into_iter()
        .map(|(name, rows)| RiskGroup {
            name,
            assessments: rows.len(),
            average_risk_score: mean(rows.iter().map(|a| a.risk_score)).unwrap_or(0.0),
            total_impact: rows.iter().map(|a| a.overall_impact).sum(),
            elevated: rows
                .iter()
                .filter(|a| a.risk_level >= RiskLevel::High)
                .count(),
        })
        .collect();
    out.sort_by(|a, b| {
        b.average_risk_score
            .total_cmp(&a.average_risk_score)
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

/// Aggregate active assessments by industry and jurisdiction and rank the
/// top exposures.
pub fn compute_risk_analysis(
    assessments: &[ImpactAssessment],
    policies: &HashMap<Uuid, Policy>,
    companies: &HashMap<Uuid, Company>,
    top: usize,
) -> RiskAnalysis {
    let active: Vec<&ImpactAssessment> = assessments.iter().filter(|a| a.is_active()).collect();

    let by_industry = group_risk(&active, |a| {
        companies.get(&a.company_id).map(|c| c.industry.clone())
    });
    let by_jurisdiction = group_risk(&active, |a| {
        policies
            .get(&a.policy_id)
            .map(|p| p.jurisdiction.as_str().to_string())
    });

    let mut ranked = active.clone();
    ranked.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.overall_impact.total_cmp(&b.overall_impact))
            .then_with(|| a.id.cmp(&b.id))
    });
    let top_exposures = ranked
        .into_iter()
        .take(top)
        .map(|a| RiskExposure {
            assessment_id: a.id,
            policy_id: a.policy_id,
            policy_title: policies
                .get(&a.policy_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            company_id: a.company_id,
            company_name: companies
                .get(&a.company_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            overall_impact: a.overall_impact,
            risk_level: a.risk_level,
            risk_score: a.risk_score,
        })
        .collect();

    RiskAnalysis {
        total_assessments: active.len(),
        average_risk_score: mean(active.iter().map(|a| a.risk_score)),
        risk_distribution: risk_distribution(active.iter().copied()),
        by_industry,
        by_jurisdiction,
        top_exposures,
    }
}

/// Snapshot of the stores for the risk aggregates.
pub fn risk_inputs(
    state: &AppState,
) -> (Vec<ImpactAssessment>, HashMap<Uuid, Policy>, HashMap<Uuid, Company>) {
    let assessments = state
        .ledger
        .read()
        .all_active()
        .into_iter()
        .cloned()
        .collect();
    let policies = state.policies.list().into_iter().map(|p| (p.id, p)).collect();
    let companies = state.companies.list().into_iter().map(|c| (c.id, c)).collect();
    (assessments, policies, companies)
}

/// GET /api/v1/analytics/risk-analysis — Risk distribution and exposures.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/risk-analysis",
    params(RiskAnalysisQuery),
    responses((status = 200, description = "Risk analysis (data)", body = RiskAnalysis)),
    tag = "analytics"
)]
async fn risk_analysis(
    State(state): State<AppState>,
    query: Result<Query<RiskAnalysisQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let q = extract_query(query)?;
    let top = q.top.unwrap_or(10);
    let analysis = state
        .cache
        .get_or_compute(format!("analytics:risk:{top}"), || async {
            let (assessments, policies, companies) = risk_inputs(&state);
            Ok::<_, AppError>(compute_risk_analysis(&assessments, &policies, &companies, top))
        })
        .await?;
    Ok(Json(ApiResponse::ok(analysis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_labels_roll_over_years() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let i = month_index(d);
        assert_eq!(month_label(i), "2025-01");
        assert_eq!(month_label(i - 1), "2024-12");
    }

    #[test]
    fn trends_cover_requested_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let report = compute_trends(&[], &[], 6, now);
        assert_eq!(
            report.months,
            vec!["2024-10", "2024-11", "2024-12", "2025-01", "2025-02", "2025-03"]
        );
        assert_eq!(report.policy_trends.proposed, vec![0; 6]);
        assert!(report.impact_trends.average_impact.iter().all(Option::is_none));
    }

    #[test]
    fn empty_distribution_lists_every_level() {
        let d = risk_distribution(&[]);
        assert_eq!(d.len(), 4);
        assert!(d.values().all(|&c| c == 0));
    }

    #[test]
    fn empty_risk_analysis() {
        let analysis = compute_risk_analysis(&[], &HashMap::new(), &HashMap::new(), 10);
        assert_eq!(analysis.total_assessments, 0);
        assert!(analysis.average_risk_score.is_none());
        assert!(analysis.top_exposures.is_empty());
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(Vec::new()), None);
        assert_eq!(mean(vec![1.0, 3.0]), Some(2.0));
    }
}
