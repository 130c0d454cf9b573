//! # Industry and Policy Taxonomy
//!
//! The single definition of the industries PolicyRadar tracks, the risk
//! factors attached to the five modelled industries, and the policy
//! category groups with their sub-categories. The impact engine derives
//! breakdown weights and risk factors from here.

use serde::{Deserialize, Serialize};

/// All industries tracked by the platform.
pub const INDUSTRIES: [&str; 20] = [
    "financial_services",
    "technology",
    "energy",
    "healthcare",
    "manufacturing",
    "retail",
    "telecommunications",
    "automotive",
    "aerospace",
    "pharmaceuticals",
    "real_estate",
    "transportation",
    "agriculture",
    "mining",
    "utilities",
    "media",
    "consulting",
    "education",
    "government",
    "non_profit",
];

/// Regulatory context for one modelled industry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndustryConfig {
    /// Industry slug (one of [`INDUSTRIES`]).
    pub industry: &'static str,
    /// Key regulations that drive policy exposure.
    pub regulations: &'static [&'static str],
    /// Risk factors scored on every assessment for this industry.
    pub risk_factors: &'static [&'static str],
    /// Financial metrics most sensitive to policy change.
    pub impact_metrics: &'static [&'static str],
}

/// Industries with a dedicated risk model.
pub const INDUSTRY_CONFIGS: [IndustryConfig; 5] = [
    IndustryConfig {
        industry: "financial_services",
        regulations: &["basel_iii", "dodd_frank", "mifid_ii", "gdpr"],
        risk_factors: &["capital_requirements", "liquidity_ratios", "stress_testing"],
        impact_metrics: &["tier_1_capital", "leverage_ratio", "lcr", "nsfr"],
    },
    IndustryConfig {
        industry: "technology",
        regulations: &["gdpr", "ccpa", "digital_services_act", "ai_act"],
        risk_factors: &["data_privacy", "market_dominance", "algorithmic_bias"],
        impact_metrics: &["compliance_costs", "market_share", "revenue_impact"],
    },
    IndustryConfig {
        industry: "energy",
        regulations: &["paris_agreement", "carbon_pricing", "renewable_standards"],
        risk_factors: &["carbon_tax", "renewable_targets", "grid_modernization"],
        impact_metrics: &["carbon_costs", "capital_expenditure", "operating_costs"],
    },
    IndustryConfig {
        industry: "healthcare",
        regulations: &["hipaa", "fda_regulations", "medicare_reform"],
        risk_factors: &["reimbursement_changes", "approval_processes", "data_sharing"],
        impact_metrics: &["reimbursement_rates", "approval_timelines", "compliance_costs"],
    },
    IndustryConfig {
        industry: "manufacturing",
        regulations: &["trade_tariffs", "environmental_standards", "labor_laws"],
        risk_factors: &["supply_chain_disruption", "cost_inflation", "regulatory_compliance"],
        impact_metrics: &["input_costs", "export_revenue", "compliance_costs"],
    },
];

/// Look up the risk model for an industry, if one exists.
pub fn industry_config(industry: &str) -> Option<&'static IndustryConfig> {
    INDUSTRY_CONFIGS.iter().find(|c| c.industry == industry)
}

/// Whether `industry` is one of the tracked industries.
pub fn is_known_industry(industry: &str) -> bool {
    INDUSTRIES.contains(&industry)
}

/// Coarse policy family a category belongs to.
///
/// The group selects how an impact splits across revenue, cost, capital
/// and tax, and which regulatory risk factors are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    /// Tariffs, quotas, trade agreements, export controls.
    Trade,
    /// Capital, liquidity and reporting rules for financial firms.
    Financial,
    /// Carbon pricing, emissions and renewable mandates.
    Environmental,
    /// Corporate and withholding tax.
    Tax,
    /// Wages, workplace safety, union rights, immigration.
    Labor,
    /// Privacy, AI, cybersecurity, antitrust.
    Technology,
    /// Drug pricing, insurance, telehealth, approvals.
    Healthcare,
    /// Energy market and grid policy.
    Energy,
    /// Anything not classified.
    General,
}

impl CategoryGroup {
    /// Every group, in declaration order.
    pub const ALL: [CategoryGroup; 9] = [
        Self::Trade,
        Self::Financial,
        Self::Environmental,
        Self::Tax,
        Self::Labor,
        Self::Technology,
        Self::Healthcare,
        Self::Energy,
        Self::General,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Financial => "financial",
            Self::Environmental => "environmental",
            Self::Tax => "tax",
            Self::Labor => "labor",
            Self::Technology => "technology",
            Self::Healthcare => "healthcare",
            Self::Energy => "energy",
            Self::General => "general",
        }
    }

    /// Sub-categories tracked for the group.
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            Self::Trade => &["tariffs", "quotas", "trade_agreements", "export_controls"],
            Self::Financial => &[
                "capital_requirements",
                "liquidity_rules",
                "stress_testing",
                "reporting",
            ],
            Self::Environmental => &["carbon_pricing", "emissions_standards", "renewable_targets"],
            Self::Tax => &[
                "corporate_tax",
                "transfer_pricing",
                "tax_incentives",
                "withholding_tax",
            ],
            Self::Labor => &[
                "minimum_wage",
                "workplace_safety",
                "union_rights",
                "immigration",
            ],
            Self::Technology => &["data_privacy", "ai_regulation", "cybersecurity", "antitrust"],
            Self::Healthcare => &[
                "drug_pricing",
                "insurance_reform",
                "telehealth",
                "approval_processes",
            ],
            Self::Energy => &["grid_modernization", "energy_subsidies", "fuel_standards"],
            Self::General => &[],
        }
    }

    /// Classify a free-text category name.
    ///
    /// Matches on keywords so that names such as "Financial Regulation" or
    /// "Data Privacy" land in the right group. Unmatched names are
    /// [`CategoryGroup::General`].
    pub fn classify(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let has = |needle: &str| lower.contains(needle);
        if has("trade") || has("tariff") || has("export") {
            Self::Trade
        } else if has("financ") || has("bank") || has("capital") {
            Self::Financial
        } else if has("environment") || has("carbon") || has("emission") || has("climate") {
            Self::Environmental
        } else if has("tax") {
            Self::Tax
        } else if has("labor") || has("labour") || has("wage") || has("employment") {
            Self::Labor
        } else if has("technolog")
            || has("privacy")
            || has("antitrust")
            || has("cyber")
            || has("data")
        {
            Self::Technology
        } else if has("health") || has("drug") || has("pharma") {
            Self::Healthcare
        } else if has("energy") || has("grid") || has("fuel") {
            Self::Energy
        } else {
            Self::General
        }
    }
}

impl std::fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
