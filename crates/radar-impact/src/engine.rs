//! # Impact Engine
//!
//! [`ImpactEngine::assess`] is a pure function of its inputs: no clock, no
//! randomness, no I/O. [`ImpactEngine::assess_batch`] fans independent
//! jobs out over scoped worker threads and returns results in job order.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, Utc};
use radar_core::{
    AssessmentPeriod, AssessmentStatus, CategoryGroup, Company, CompanyProfile, FinancialMetrics,
    Fingerprint, ImpactAssessment, ImpactDirection, Policy, PolicyType, Scenario,
};
use serde_json::json;
use uuid::Uuid;

use crate::breakdown::ImpactBreakdown;
use crate::error::ImpactError;
use crate::exposure::{self, Exposure};
use crate::risk::{MitigationPlan, RiskInputs, RiskProfile};

/// Version stamped on every assessment. Bump when any factor changes.
pub const ENGINE_MODEL_VERSION: &str = "impact-engine/1.0.0";

/// Impacts smaller than this (M USD) are neutral.
pub const MATERIALITY_THRESHOLD: f64 = 0.5;

/// Confidence assumed when the policy carries none.
pub const DEFAULT_IMPACT_CONFIDENCE: f64 = 0.5;

const CONFIDENCE_FLOOR: f64 = 0.05;
const CONFIDENCE_CEILING: f64 = 0.99;
const INTERVAL_SPREAD: f64 = 2.0;
const SENSITIVITY_SWING: f64 = 0.2;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Records the engine reads for one (policy, company) pair.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentInput<'a> {
    /// Policy being assessed.
    pub policy: &'a Policy,
    /// Category group of the policy (general when uncategorised).
    pub group: CategoryGroup,
    /// Company being assessed.
    pub company: &'a Company,
    /// Company profile, if any.
    pub profile: Option<&'a CompanyProfile>,
    /// Latest financial metrics, if any.
    pub metrics: Option<&'a FinancialMetrics>,
}

impl<'a> AssessmentInput<'a> {
    /// Input with no profile or financials.
    pub fn new(policy: &'a Policy, group: CategoryGroup, company: &'a Company) -> Self {
        Self {
            policy,
            group,
            company,
            profile: None,
            metrics: None,
        }
    }

    /// Attach a profile.
    pub fn with_profile(mut self, profile: Option<&'a CompanyProfile>) -> Self {
        self.profile = profile;
        self
    }

    /// Attach the latest financial metrics.
    pub fn with_metrics(mut self, metrics: Option<&'a FinancialMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Reject inputs with no usable content; return (estimated impact, revenue).
    fn resolve(&self) -> Result<(f64, f64), ImpactError> {
        if self.policy.title.trim().is_empty() {
            return Err(ImpactError::MissingInput("policy title"));
        }
        let estimated = self
            .policy
            .estimated_impact
            .ok_or(ImpactError::MissingInput("policy estimated_impact"))?;
        if self.company.industry.trim().is_empty() {
            return Err(ImpactError::MissingInput("company industry"));
        }
        let revenue = exposure::resolve_revenue(self.company, self.metrics).ok_or(
            ImpactError::MissingInput("company revenue, financial metrics or market cap"),
        )?;
        self.policy.validate()?;
        if let Some(profile) = self.profile {
            profile.validate()?;
        }
        Ok((estimated, revenue))
    }
}

/// Caller-supplied identity and framing of an assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    /// ID for the new record.
    pub id: Uuid,
    /// Scenario to compute under.
    pub scenario: Scenario,
    /// Evaluation period.
    pub period: AssessmentPeriod,
    /// Assessment timestamp.
    pub assessment_date: DateTime<Utc>,
}

impl AssessmentRequest {
    /// Baseline request with a fresh ID.
    pub fn baseline(period: AssessmentPeriod, assessment_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario: Scenario::Baseline,
            period,
            assessment_date,
        }
    }

    /// Same request under another scenario.
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }
}

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct AssessmentJob<'a> {
    /// Records to assess.
    pub input: AssessmentInput<'a>,
    /// Framing.
    pub request: AssessmentRequest,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Factors that do not depend on the scenario or the estimate.
#[derive(Debug, Clone, Copy)]
struct Factors {
    exposure: Exposure,
    status_weight: f64,
    size: f64,
    revenue: f64,
}

impl Factors {
    fn base(&self, estimated_impact: f64) -> f64 {
        estimated_impact * self.exposure.total() * self.status_weight * self.size
    }

    fn overall(&self, estimated_impact: f64, scenario: Scenario) -> f64 {
        let base = self.base(estimated_impact);
        base + base.abs() * scenario.shift()
    }
}

/// The impact assessment engine.
#[derive(Debug, Clone)]
pub struct ImpactEngine {
    workers: usize,
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl ImpactEngine {
    /// Engine with `workers` threads for batch runs (minimum one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Assess one pair.
    pub fn assess(
        &self,
        input: &AssessmentInput<'_>,
        request: &AssessmentRequest,
    ) -> Result<ImpactAssessment, ImpactError> {
        let (estimated, revenue) = input.resolve()?;
        let policy = input.policy;
        let company = input.company;

        let factors = Factors {
            exposure: Exposure::of(policy, company),
            status_weight: exposure::status_weight(policy.status),
            size: exposure::size_factor(revenue),
            revenue,
        };
        let overall = factors.overall(estimated, request.scenario);
        let breakdown = ImpactBreakdown::split(overall, input.group);

        let completeness = exposure::completeness(input.profile.is_some(), input.metrics.is_some());
        let certainty = exposure::status_certainty(policy.status);
        let confidence = (policy.impact_confidence.unwrap_or(DEFAULT_IMPACT_CONFIDENCE)
            * completeness
            * certainty)
            .clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

        let half_width = overall.abs() * (1.0 - confidence) * INTERVAL_SPREAD;
        let (lower, upper) = (overall - half_width, overall + half_width);
        let direction = direction_of(overall, lower, upper);

        let political_exposure = input.profile.and_then(|p| p.political_exposure);
        let risk = RiskProfile::assess(
            RiskInputs {
                probability: factors.status_weight,
                interval_lower: lower,
                revenue,
                political_exposure,
                debt_to_equity: input.metrics.and_then(|m| m.debt_to_equity),
            },
            &company.industry,
            input.group,
        );

        let implementation_date = policy.effective_date.or(policy.enacted_date);
        let transition = transition_months(policy.policy_type);
        let compliance_deadline =
            implementation_date.and_then(|d| d.checked_add_months(Months::new(transition)));

        let mitigation = MitigationPlan::for_level(risk.level, overall);

        let mut sensitivity: BTreeMap<String, f64> = Scenario::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), factors.overall(estimated, *s)))
            .collect();
        sensitivity.insert(
            "estimate_plus_20pct".to_string(),
            factors.overall(estimated * (1.0 + SENSITIVITY_SWING), request.scenario),
        );
        sensitivity.insert(
            "estimate_minus_20pct".to_string(),
            factors.overall(estimated * (1.0 - SENSITIVITY_SWING), request.scenario),
        );

        let key_assumptions: BTreeMap<String, f64> = [
            ("estimated_impact", estimated),
            ("industry_exposure", factors.exposure.industry),
            ("jurisdiction_exposure", factors.exposure.jurisdiction),
            ("status_weight", factors.status_weight),
            ("size_factor", factors.size),
            ("revenue", factors.revenue),
            ("base_impact", factors.base(estimated)),
            ("scenario_shift", request.scenario.shift()),
            ("data_completeness", completeness),
            ("status_certainty", certainty),
            (
                "political_exposure",
                political_exposure.unwrap_or(crate::risk::DEFAULT_POLITICAL_EXPOSURE),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let fingerprint = Self::fingerprint(input, request.scenario, &request.period)?;

        let analysis_summary = format!(
            "{} is expected to have a {} impact of {:.1}M USD on {} over {} \
             ({} risk, {:.0}% confidence).",
            policy.title,
            direction_label(direction),
            overall,
            company.name,
            request.period,
            risk.level,
            confidence * 100.0,
        );

        tracing::debug!(
            policy_id = %policy.id,
            company_id = %company.id,
            scenario = request.scenario.as_str(),
            overall,
            risk_score = risk.score,
            "impact assessed"
        );

        Ok(ImpactAssessment {
            id: request.id,
            policy_id: policy.id,
            company_id: company.id,
            assessment_date: request.assessment_date,
            assessment_period: request.period.clone(),
            scenario: request.scenario,
            overall_impact: overall,
            impact_direction: direction,
            confidence_level: confidence,
            confidence_interval_lower: lower,
            confidence_interval_upper: upper,
            revenue_impact: breakdown.revenue,
            cost_impact: breakdown.cost,
            capital_impact: breakdown.capital,
            tax_impact: breakdown.tax,
            risk_level: risk.level,
            risk_score: risk.score,
            risk_factors: risk.factor_names(),
            risk_scores: risk.factors,
            implementation_date,
            compliance_deadline,
            transition_period: transition,
            mitigation_strategies: mitigation.strategies,
            mitigation_cost: mitigation.cost,
            mitigation_effectiveness: mitigation.effectiveness,
            analysis_summary,
            key_assumptions,
            sensitivity_analysis: sensitivity,
            model_version: ENGINE_MODEL_VERSION.to_string(),
            input_fingerprint: fingerprint.into_string(),
            status: AssessmentStatus::Active,
            supersedes: None,
            created_at: request.assessment_date,
            updated_at: request.assessment_date,
        })
    }

    /// Assess many pairs on up to `workers` threads. Results keep job order.
    pub fn assess_batch(
        &self,
        jobs: &[AssessmentJob<'_>],
    ) -> Vec<Result<ImpactAssessment, ImpactError>> {
        if jobs.is_empty() {
            return Vec::new();
        }
        let workers = self.workers.clamp(1, jobs.len());
        let chunk = jobs.len().div_ceil(workers);

        std::thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .chunks(chunk)
                .map(|part| {
                    scope.spawn(move || {
                        part.iter()
                            .map(|job| self.assess(&job.input, &job.request))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    /// Digest of every input that can change the output.
    pub fn fingerprint(
        input: &AssessmentInput<'_>,
        scenario: Scenario,
        period: &AssessmentPeriod,
    ) -> Result<Fingerprint, ImpactError> {
        let p = input.policy;
        let c = input.company;
        let doc = json!({
            "model_version": ENGINE_MODEL_VERSION,
            "period": period.as_str(),
            "scenario": scenario.as_str(),
            "policy": {
                "id": p.id,
                "title": p.title,
                "jurisdiction": p.jurisdiction.as_str(),
                "policy_type": p.policy_type.as_str(),
                "status": p.status.as_str(),
                "enacted_date": p.enacted_date,
                "effective_date": p.effective_date,
                "estimated_impact": p.estimated_impact,
                "impact_confidence": p.impact_confidence,
                "affected_industries": p.affected_industries,
                "group": input.group.as_str(),
            },
            "company": {
                "id": c.id,
                "name": c.name,
                "industry": c.industry,
                "headquarters_country": c.headquarters_country,
                "primary_markets": c.primary_markets,
                "regulatory_jurisdictions": c.regulatory_jurisdictions,
                "revenue": c.revenue,
                "market_cap": c.market_cap,
            },
            "profile": input.profile.map(|pr| json!({
                "political_exposure": pr.political_exposure,
            })),
            "metrics": input.metrics.map(|m| json!({
                "total_revenue": m.total_revenue,
                "debt_to_equity": m.debt_to_equity,
            })),
        });
        Fingerprint::of(&doc).map_err(ImpactError::from)
    }
}

fn direction_of(overall: f64, lower: f64, upper: f64) -> ImpactDirection {
    if overall.abs() < MATERIALITY_THRESHOLD {
        ImpactDirection::Neutral
    } else if lower < 0.0 && upper > 0.0 {
        ImpactDirection::Mixed
    } else if overall > 0.0 {
        ImpactDirection::Positive
    } else {
        ImpactDirection::Negative
    }
}

fn direction_label(direction: ImpactDirection) -> &'static str {
    match direction {
        ImpactDirection::Positive => "positive",
        ImpactDirection::Negative => "negative",
        ImpactDirection::Neutral => "neutral",
        ImpactDirection::Mixed => "mixed",
    }
}

/// Months between implementation and the compliance deadline.
pub fn transition_months(policy_type: PolicyType) -> u32 {
    match policy_type {
        PolicyType::Legislation => 12,
        PolicyType::Regulation => 6,
        PolicyType::ExecutiveOrder => 3,
        PolicyType::Guidance => 0,
        PolicyType::Standard => 9,
        PolicyType::Agreement => 18,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{company, metrics, policy, profile};
    use chrono::TimeZone;
    use radar_core::{PolicyStatus, RiskLevel};

    fn request() -> AssessmentRequest {
        AssessmentRequest {
            id: Uuid::nil(),
            scenario: Scenario::Baseline,
            period: AssessmentPeriod::new("2025-2026").unwrap(),
            assessment_date: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn worked_example() {
        let p = policy();
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Environmental, &c);
        let a = ImpactEngine::default().assess(&input, &request()).unwrap();

        // exposure 1.0 * 0.6, weight 0.9, size 8000/18000
        let expected = -400.0 * 0.6 * 0.9 * (8_000.0 / 18_000.0);
        assert!((a.overall_impact - expected).abs() < 1e-9);
        assert_eq!(a.impact_direction, ImpactDirection::Negative);

        // 0.8 * 0.8 (no profile, no metrics) * 0.95
        assert!((a.confidence_level - 0.608).abs() < 1e-9);
        assert!(a.confidence_interval_lower < a.overall_impact);
        assert!(a.confidence_interval_upper > a.overall_impact);

        assert!((a.cost_impact - expected * 0.6).abs() < 1e-9);
        assert!((a.capital_impact - expected * 0.3).abs() < 1e-9);
        assert_eq!(a.transition_period, 6);
        assert_eq!(
            a.compliance_deadline,
            Some(Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(a.model_version, ENGINE_MODEL_VERSION);
        assert_eq!(a.status, AssessmentStatus::Active);
        assert_eq!(a.risk_factors.len(), 3 + 3);
    }

    #[test]
    fn missing_estimate_is_rejected() {
        let mut p = policy();
        p.estimated_impact = None;
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::General, &c);
        let err = ImpactEngine::default().assess(&input, &request()).unwrap_err();
        assert!(matches!(err, ImpactError::MissingInput("policy estimated_impact")));
    }

    #[test]
    fn missing_revenue_is_rejected() {
        let p = policy();
        let mut c = company();
        c.revenue = None;
        c.market_cap = None;
        let input = AssessmentInput::new(&p, CategoryGroup::General, &c);
        assert!(matches!(
            ImpactEngine::default().assess(&input, &request()),
            Err(ImpactError::MissingInput(_))
        ));
    }

    #[test]
    fn repealed_policy_is_neutral_and_low_risk() {
        let mut p = policy();
        p.status = PolicyStatus::Repealed;
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let a = ImpactEngine::default().assess(&input, &request()).unwrap();
        assert_eq!(a.overall_impact.abs(), 0.0);
        assert_eq!(a.impact_direction, ImpactDirection::Neutral);
        assert_eq!(a.risk_level, RiskLevel::Low);
    }

    #[test]
    fn low_confidence_interval_straddles_zero_as_mixed() {
        let mut p = policy();
        p.impact_confidence = Some(0.3);
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let a = ImpactEngine::default().assess(&input, &request()).unwrap();
        assert_eq!(a.impact_direction, ImpactDirection::Mixed);
    }

    #[test]
    fn scenarios_order_impacts() {
        let p = policy();
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let engine = ImpactEngine::default();
        let impact = |s| engine.assess(&input, &request().with_scenario(s)).unwrap().overall_impact;
        let (opt, base, pess, worst) = (
            impact(Scenario::Optimistic),
            impact(Scenario::Baseline),
            impact(Scenario::Pessimistic),
            impact(Scenario::WorstCase),
        );
        assert!(opt > base && base > pess && pess > worst);
        assert!((worst - 2.0 * base).abs() < 1e-9);
    }

    #[test]
    fn sensitivity_covers_scenarios_and_estimate_swing() {
        let p = policy();
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let a = ImpactEngine::default().assess(&input, &request()).unwrap();
        for s in Scenario::ALL {
            assert!(a.sensitivity_analysis.contains_key(s.as_str()));
        }
        let plus = a.sensitivity_analysis["estimate_plus_20pct"];
        assert!((plus - a.overall_impact * 1.2).abs() < 1e-9);
    }

    #[test]
    fn richer_inputs_raise_confidence_and_change_fingerprint() {
        let p = policy();
        let c = company();
        let pr = profile(c.id, 0.9);
        let m = metrics(c.id, 9_000.0);
        let bare = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let full = bare.with_profile(Some(&pr)).with_metrics(Some(&m));
        let engine = ImpactEngine::default();
        let a = engine.assess(&bare, &request()).unwrap();
        let b = engine.assess(&full, &request()).unwrap();
        assert!(b.confidence_level > a.confidence_level);
        assert_ne!(a.input_fingerprint, b.input_fingerprint);
    }

    #[test]
    fn fingerprint_ignores_request_id_and_date() {
        let p = policy();
        let c = company();
        let input = AssessmentInput::new(&p, CategoryGroup::Trade, &c);
        let engine = ImpactEngine::default();
        let mut r2 = request();
        r2.id = Uuid::new_v4();
        r2.assessment_date = Utc::now();
        let a = engine.assess(&input, &request()).unwrap();
        let b = engine.assess(&input, &r2).unwrap();
        assert_eq!(a.input_fingerprint, b.input_fingerprint);
    }

    #[test]
    fn batch_preserves_order() {
        let policies: Vec<Policy> = (0..9)
            .map(|i| {
                let mut p = policy();
                p.estimated_impact = Some(-100.0 * (i + 1) as f64);
                p
            })
            .collect();
        let c = company();
        let jobs: Vec<AssessmentJob<'_>> = policies
            .iter()
            .map(|p| AssessmentJob {
                input: AssessmentInput::new(p, CategoryGroup::Trade, &c),
                request: request(),
            })
            .collect();
        let results = ImpactEngine::new(4).assess_batch(&jobs);
        assert_eq!(results.len(), 9);
        for (p, r) in policies.iter().zip(&results) {
            assert_eq!(r.as_ref().unwrap().policy_id, p.id);
        }
        assert!(ImpactEngine::new(2).assess_batch(&[]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::fixtures::{company, policy};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use radar_core::PolicyStatus;

    fn status() -> impl Strategy<Value = PolicyStatus> {
        prop::sample::select(PolicyStatus::ALL.to_vec())
    }

    fn scenario() -> impl Strategy<Value = Scenario> {
        prop::sample::select(Scenario::ALL.to_vec())
    }

    fn group() -> impl Strategy<Value = CategoryGroup> {
        prop::sample::select(CategoryGroup::ALL.to_vec())
    }

    fn request(scenario: Scenario) -> AssessmentRequest {
        AssessmentRequest {
            id: Uuid::nil(),
            scenario,
            period: AssessmentPeriod::new("2025-2026").unwrap(),
            assessment_date: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
        }
    }

    proptest! {
        /// Identical inputs give identical records.
        #[test]
        fn assessment_is_deterministic(
            impact in -5_000.0f64..5_000.0,
            conf in 0.0f64..=1.0,
            revenue in 1.0f64..100_000.0,
            st in status(),
            sc in scenario(),
            g in group(),
        ) {
            let mut p = policy();
            p.estimated_impact = Some(impact);
            p.impact_confidence = Some(conf);
            p.status = st;
            let mut c = company();
            c.revenue = Some(revenue);
            let input = AssessmentInput::new(&p, g, &c);
            let engine = ImpactEngine::default();
            let a = engine.assess(&input, &request(sc)).unwrap();
            let b = engine.assess(&input, &request(sc)).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Risk score is bounded and the interval brackets the estimate.
        #[test]
        fn score_bounded_and_interval_ordered(
            impact in -50_000.0f64..50_000.0,
            conf in 0.0f64..=1.0,
            revenue in 0.01f64..1_000_000.0,
            st in status(),
            sc in scenario(),
            g in group(),
        ) {
            let mut p = policy();
            p.estimated_impact = Some(impact);
            p.impact_confidence = Some(conf);
            p.status = st;
            let mut c = company();
            c.revenue = Some(revenue);
            let input = AssessmentInput::new(&p, g, &c);
            let a = ImpactEngine::default().assess(&input, &request(sc)).unwrap();
            prop_assert!((0.0..=1.0).contains(&a.risk_score));
            prop_assert!((0.05..=0.99).contains(&a.confidence_level));
            prop_assert!(a.confidence_interval_lower <= a.overall_impact);
            prop_assert!(a.overall_impact <= a.confidence_interval_upper);
            let parts = a.revenue_impact + a.cost_impact + a.capital_impact + a.tax_impact;
            let tolerance = 1e-9 * a.overall_impact.abs().max(1.0);
            prop_assert!((parts - a.overall_impact).abs() <= tolerance);
        }
    }
}
