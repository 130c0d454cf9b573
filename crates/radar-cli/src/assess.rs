//! # Assess Subcommand
//!
//! Runs the impact engine over every (policy, company) pair in a dataset
//! where the company is in an affected industry and operates in the
//! policy's jurisdiction. Pairs are processed in batches of
//! `batch_size`; each batch is spread over `max_workers` threads.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use radar_core::{
    AssessmentPeriod, CategoryGroup, Company, CompanyProfile, FinancialMetrics, ImpactAssessment,
    Policy, RiskLevel, Scenario, Settings,
};
use radar_impact::{AssessmentInput, AssessmentJob, AssessmentRequest, ImpactEngine};
use radar_synth::Dataset;
use serde::Serialize;
use uuid::Uuid;

/// Scenario names accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    Baseline,
    Optimistic,
    Pessimistic,
    WorstCase,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Baseline => Scenario::Baseline,
            ScenarioArg::Optimistic => Scenario::Optimistic,
            ScenarioArg::Pessimistic => Scenario::Pessimistic,
            ScenarioArg::WorstCase => Scenario::WorstCase,
        }
    }
}

/// Arguments for the `radar assess` subcommand.
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Dataset directory written by `radar generate`.
    #[arg(long, value_name = "DIR")]
    pub data: PathBuf,

    /// Evaluation period `YYYY-YYYY`. Defaults to the current year.
    #[arg(long)]
    pub period: Option<String>,

    /// Scenario to evaluate.
    #[arg(long, value_enum, default_value_t = ScenarioArg::Baseline)]
    pub scenario: ScenarioArg,

    /// Write every assessment as a JSON array to this file.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// What an assessment run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AssessSummary {
    pub period: AssessmentPeriod,
    pub scenario: Scenario,
    /// Pairs considered.
    pub pairs: usize,
    pub assessed: usize,
    /// Pairs the engine rejected for missing inputs.
    pub skipped: usize,
    pub total_impact: f64,
    pub average_impact: Option<f64>,
    pub risk_distribution: BTreeMap<String, usize>,
}

/// Run the engine over `dataset`. Returns the assessments and a summary.
pub fn assess_dataset(
    dataset: &Dataset,
    engine: &ImpactEngine,
    batch_size: usize,
    period: &AssessmentPeriod,
    scenario: Scenario,
    now: DateTime<Utc>,
) -> (Vec<ImpactAssessment>, AssessSummary) {
    let groups: HashMap<Uuid, CategoryGroup> = dataset
        .policy_categories
        .iter()
        .map(|c| (c.id, c.group))
        .collect();
    let profiles: HashMap<Uuid, &CompanyProfile> = dataset
        .company_profiles
        .iter()
        .map(|p| (p.company_id, p))
        .collect();
    let mut by_company: HashMap<Uuid, Vec<FinancialMetrics>> = HashMap::new();
    for m in &dataset.financial_metrics {
        by_company.entry(m.company_id).or_default().push(m.clone());
    }
    let latest: HashMap<Uuid, FinancialMetrics> = by_company
        .iter()
        .filter_map(|(id, rows)| FinancialMetrics::latest(rows).map(|m| (*id, m.clone())))
        .collect();

    let pairs: Vec<(&Policy, CategoryGroup, &Company)> = dataset
        .policies
        .iter()
        .flat_map(|policy| {
            let group = policy
                .category_id
                .and_then(|id| groups.get(&id).copied())
                .unwrap_or(CategoryGroup::General);
            dataset
                .companies
                .iter()
                .filter(move |c| {
                    policy.affects_industry(&c.industry)
                        && c.has_presence_in(policy.jurisdiction.as_str())
                })
                .map(move |c| (policy, group, c))
        })
        .collect();

    let mut assessments = Vec::new();
    let mut skipped = 0;
    for chunk in pairs.chunks(batch_size.max(1)) {
        let jobs: Vec<AssessmentJob<'_>> = chunk
            .iter()
            .map(|(policy, group, company)| AssessmentJob {
                input: AssessmentInput::new(policy, *group, company)
                    .with_profile(profiles.get(&company.id).copied())
                    .with_metrics(latest.get(&company.id)),
                request: AssessmentRequest::baseline(period.clone(), now).with_scenario(scenario),
            })
            .collect();
        for (result, job) in engine.assess_batch(&jobs).into_iter().zip(&jobs) {
            match result {
                Ok(a) => assessments.push(a),
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(
                        policy_id = %job.input.policy.id,
                        company_id = %job.input.company.id,
                        error = %e,
                        "assessment skipped"
                    );
                }
            }
        }
        tracing::debug!(batch = chunk.len(), done = assessments.len(), "batch assessed");
    }

    let mut risk_distribution: BTreeMap<String, usize> = RiskLevel::ALL
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    for a in &assessments {
        *risk_distribution
            .entry(a.risk_level.as_str().to_string())
            .or_default() += 1;
    }
    let total_impact: f64 = assessments.iter().map(|a| a.overall_impact).sum();
    let summary = AssessSummary {
        period: period.clone(),
        scenario,
        pairs: pairs.len(),
        assessed: assessments.len(),
        skipped,
        total_impact,
        average_impact: (!assessments.is_empty()).then(|| total_impact / assessments.len() as f64),
        risk_distribution,
    };
    (assessments, summary)
}

/// Execute the assess subcommand.
///
/// Returns exit code 0 on success.
pub fn run_assess(args: &AssessArgs, settings: &Settings) -> Result<u8> {
    let dataset = crate::load_dataset(&args.data)?;
    let now = Utc::now();
    let period = match &args.period {
        Some(p) => AssessmentPeriod::new(p).with_context(|| format!("invalid --period {p}"))?,
        None => AssessmentPeriod::current(now),
    };

    let engine = ImpactEngine::new(settings.max_workers);
    let (assessments, summary) = assess_dataset(
        &dataset,
        &engine,
        settings.batch_size,
        &period,
        args.scenario.into(),
        now,
    );
    tracing::info!(
        pairs = summary.pairs,
        assessed = summary.assessed,
        skipped = summary.skipped,
        "Assessment run complete"
    );

    if let Some(out) = &args.out {
        let text = serde_json::to_string_pretty(&assessments)
            .context("failed to serialise assessments")?;
        std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!(out = %out.display(), "Assessments written");
    }
    crate::print_json(&summary)?;
    Ok(0)
}
