//! # Dataset
//!
//! The full set of records a generation run produces, and the loader that
//! reads an exported directory back. Each entity set lives in its own
//! `{name}.json` file; missing files load as empty sets, but a directory
//! with none of them is rejected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use radar_core::{
    Company, CompanyProfile, EconomicIndicator, FinancialMetrics, ImpactAssessment, MarketData,
    Policy, PolicyCategory, PolicyChange, TradeFlow, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// File holding the generation summary.
pub const SUMMARY_FILE: &str = "generation_summary.json";

/// Entity set file stems, in load order.
pub const SET_NAMES: [&str; 10] = [
    "policy_categories",
    "policies",
    "policy_changes",
    "companies",
    "company_profiles",
    "financial_metrics",
    "market_data",
    "economic_indicators",
    "trade_flows",
    "impact_assessments",
];

/// Every record set of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Policy categories.
    pub policy_categories: Vec<PolicyCategory>,
    /// Policies.
    pub policies: Vec<Policy>,
    /// Policy change history.
    pub policy_changes: Vec<PolicyChange>,
    /// Companies.
    pub companies: Vec<Company>,
    /// One profile per company.
    pub company_profiles: Vec<CompanyProfile>,
    /// Quarterly financials.
    pub financial_metrics: Vec<FinancialMetrics>,
    /// Daily prices.
    pub market_data: Vec<MarketData>,
    /// Quarterly macro indicators.
    pub economic_indicators: Vec<EconomicIndicator>,
    /// Customs trade flows.
    pub trade_flows: Vec<TradeFlow>,
    /// Engine-produced baseline assessments.
    pub impact_assessments: Vec<ImpactAssessment>,
}

/// Contents of `generation_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// When the files were written.
    pub generated_at: DateTime<Utc>,
    /// Seed used.
    pub seed: u64,
    /// First date of the range.
    pub start: NaiveDate,
    /// Last date of the range.
    pub end: NaiveDate,
    /// Records per set.
    pub counts: BTreeMap<String, usize>,
    /// Sum of `counts`.
    pub total_records: usize,
}

impl Dataset {
    /// Records per set, keyed by file stem.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let sizes = [
            self.policy_categories.len(),
            self.policies.len(),
            self.policy_changes.len(),
            self.companies.len(),
            self.company_profiles.len(),
            self.financial_metrics.len(),
            self.market_data.len(),
            self.economic_indicators.len(),
            self.trade_flows.len(),
            self.impact_assessments.len(),
        ];
        SET_NAMES
            .iter()
            .zip(sizes)
            .map(|(name, n)| (name.to_string(), n))
            .collect()
    }

    /// Total records across all sets.
    pub fn total_records(&self) -> usize {
        self.counts().values().sum()
    }

    /// Whether every set is empty.
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    /// Summary for export.
    pub fn summary(
        &self,
        seed: u64,
        start: NaiveDate,
        end: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> DatasetSummary {
        let counts = self.counts();
        DatasetSummary {
            generated_at,
            seed,
            start,
            end,
            total_records: counts.values().sum(),
            counts,
        }
    }

    /// Validate every record that carries field constraints.
    pub fn validate(&self) -> Result<(), SynthError> {
        check_all("policies", &self.policies, Policy::validate)?;
        check_all("policy_changes", &self.policy_changes, PolicyChange::validate)?;
        check_all("companies", &self.companies, Company::validate)?;
        check_all("company_profiles", &self.company_profiles, CompanyProfile::validate)?;
        check_all("financial_metrics", &self.financial_metrics, FinancialMetrics::validate)?;
        check_all("market_data", &self.market_data, MarketData::validate)?;
        check_all("economic_indicators", &self.economic_indicators, EconomicIndicator::validate)?;
        check_all("trade_flows", &self.trade_flows, TradeFlow::validate)?;
        Ok(())
    }

    /// Load an exported directory and validate it.
    pub fn load_dir(dir: &Path) -> Result<Self, SynthError> {
        let mut found = 0usize;
        let mut locate = |name: &str| -> Option<PathBuf> {
            let path = dir.join(format!("{name}.json"));
            if path.is_file() {
                found += 1;
                Some(path)
            } else {
                tracing::debug!(path = %path.display(), "dataset file absent, loading empty set");
                None
            }
        };

        let dataset = Self {
            policy_categories: read_set(locate("policy_categories"))?,
            policies: read_set(locate("policies"))?,
            policy_changes: read_set(locate("policy_changes"))?,
            companies: read_set(locate("companies"))?,
            company_profiles: read_set(locate("company_profiles"))?,
            financial_metrics: read_set(locate("financial_metrics"))?,
            market_data: read_set(locate("market_data"))?,
            economic_indicators: read_set(locate("economic_indicators"))?,
            trade_flows: read_set(locate("trade_flows"))?,
            impact_assessments: read_set(locate("impact_assessments"))?,
        };
        if found == 0 {
            return Err(SynthError::NotADataset(dir.to_path_buf()));
        }
        dataset.validate()?;
        tracing::info!(
            dir = %dir.display(),
            policies = dataset.policies.len(),
            companies = dataset.companies.len(),
            assessments = dataset.impact_assessments.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

/// Read `generation_summary.json` from `dir`, if present.
pub fn read_summary(dir: &Path) -> Result<Option<DatasetSummary>, SynthError> {
    let path = dir.join(SUMMARY_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path).map_err(|e| SynthError::io(&path, e))?;
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SynthError::json(&path, e))
}

fn read_set<T: DeserializeOwned>(path: Option<PathBuf>) -> Result<Vec<T>, SynthError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let bytes = std::fs::read(&path).map_err(|e| SynthError::io(&path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| SynthError::json(&path, e))
}

fn check_all<T>(
    file: &'static str,
    records: &[T],
    check: impl Fn(&T) -> Result<(), ValidationError>,
) -> Result<(), SynthError> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(index, r)| {
            check(r).map_err(|source| SynthError::Invalid { file, index, source })
        })
}
