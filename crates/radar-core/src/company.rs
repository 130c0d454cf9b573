//! # Company Records
//!
//! Companies are created by ingestion or onboarding. Their financial
//! metrics are appended periodically and never edited; the impact engine
//! always reads the latest entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A company whose policy exposure is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Company {
    /// Company ID.
    pub id: Uuid,
    /// Legal or trading name.
    pub name: String,
    /// Exchange ticker.
    pub ticker: Option<String>,
    /// ISIN.
    pub isin: Option<String>,
    /// CUSIP.
    pub cusip: Option<String>,
    /// Industry slug (see [`crate::taxonomy::INDUSTRIES`]).
    pub industry: String,
    /// Sector within the industry.
    pub sector: Option<String>,
    /// Sub-sector.
    pub sub_sector: Option<String>,
    /// Headquarters jurisdiction code.
    pub headquarters_country: String,
    /// Headquarters city.
    pub headquarters_city: Option<String>,
    /// Country of incorporation.
    pub incorporation_country: Option<String>,
    /// Market capitalisation (M USD).
    pub market_cap: Option<f64>,
    /// Annual revenue (M USD).
    pub revenue: Option<f64>,
    /// Headcount.
    pub employees: Option<u32>,
    /// Fortune 500 rank, if listed.
    pub fortune_500_rank: Option<u32>,
    /// Business model description.
    pub business_model: Option<String>,
    /// Jurisdictions the company sells into.
    #[serde(default)]
    pub primary_markets: Vec<String>,
    /// Supply-chain dependencies.
    #[serde(default)]
    pub supply_chain_exposure: Vec<String>,
    /// Jurisdictions whose regulators supervise the company.
    #[serde(default)]
    pub regulatory_jurisdictions: Vec<String>,
    /// Compliance regimes the company reports under.
    #[serde(default)]
    pub compliance_requirements: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_empty("name", &self.name)?;
        ValidationError::check_non_empty("industry", &self.industry)?;
        ValidationError::check_non_empty("headquarters_country", &self.headquarters_country)?;
        ValidationError::check_optional_range("market_cap", self.market_cap, 0.0, f64::MAX)?;
        ValidationError::check_optional_range("revenue", self.revenue, 0.0, f64::MAX)?;
        Ok(())
    }

    /// Whether the company operates in or is supervised by `jurisdiction`.
    pub fn has_presence_in(&self, jurisdiction: &str) -> bool {
        self.regulatory_jurisdictions
            .iter()
            .chain(self.primary_markets.iter())
            .any(|j| j.eq_ignore_ascii_case(jurisdiction))
    }
}

/// Appetite for regulatory risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    /// Conservative.
    Low,
    /// Balanced.
    Medium,
    /// Aggressive.
    High,
}

/// Qualitative profile of a company. At most one per company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompanyProfile {
    /// Profile ID.
    pub id: Uuid,
    /// Company the profile describes.
    pub company_id: Uuid,
    /// Business description.
    pub description: Option<String>,
    /// Chief executive.
    pub ceo: Option<String>,
    /// Corporate website.
    pub website: Option<String>,
    /// ESG rating (e.g. `AA`).
    pub esg_rating: Option<String>,
    /// Annual emissions (kt CO2e).
    pub carbon_footprint: Option<f64>,
    /// Risk appetite.
    pub risk_tolerance: Option<RiskTolerance>,
    /// Sensitivity to political change, in `[0, 1]`.
    pub political_exposure: Option<f64>,
    /// Externally assessed regulatory risk, in `[0, 1]`.
    pub regulatory_risk_score: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl CompanyProfile {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_optional_range(
            "political_exposure",
            self.political_exposure,
            0.0,
            1.0,
        )?;
        ValidationError::check_optional_range(
            "regulatory_risk_score",
            self.regulatory_risk_score,
            0.0,
            1.0,
        )?;
        Ok(())
    }
}

/// One reporting-period snapshot of a company's financials (M USD unless noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FinancialMetrics {
    /// Record ID.
    pub id: Uuid,
    /// Company reported on.
    pub company_id: Uuid,
    /// Reporting date.
    pub date: NaiveDate,
    /// Total revenue.
    pub total_revenue: Option<f64>,
    /// Revenue growth (fraction).
    pub revenue_growth: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// EBITDA.
    pub ebitda: Option<f64>,
    /// Profit margin (fraction).
    pub profit_margin: Option<f64>,
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Shareholders' equity.
    pub shareholders_equity: Option<f64>,
    /// Debt-to-equity ratio.
    pub debt_to_equity: Option<f64>,
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
    /// Free cash flow.
    pub free_cash_flow: Option<f64>,
    /// Market capitalisation.
    pub market_cap: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
    /// Price / earnings.
    pub pe_ratio: Option<f64>,
    /// Price / book.
    pub pb_ratio: Option<f64>,
    /// Tier 1 capital (banks).
    pub tier_1_capital: Option<f64>,
    /// Capital adequacy ratio (banks).
    pub capital_adequacy_ratio: Option<f64>,
    /// Effective tax rate (fraction).
    pub effective_tax_rate: Option<f64>,
    /// Tax expense.
    pub tax_expense: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FinancialMetrics {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_optional_range("total_revenue", self.total_revenue, 0.0, f64::MAX)?;
        ValidationError::check_optional_range(
            "debt_to_equity",
            self.debt_to_equity,
            0.0,
            f64::MAX,
        )?;
        ValidationError::check_optional_range(
            "effective_tax_rate",
            self.effective_tax_rate,
            0.0,
            1.0,
        )?;
        Ok(())
    }

    /// Pick the most recent entry from an unordered slice.
    pub fn latest(metrics: &[FinancialMetrics]) -> Option<&FinancialMetrics> {
        metrics.iter().max_by_key(|m| (m.date, m.created_at))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_company() -> Company {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Company {
            id: Uuid::new_v4(),
            name: "Northwind Steel".to_string(),
            ticker: Some("NWS".to_string()),
            isin: None,
            cusip: None,
            industry: "manufacturing".to_string(),
            sector: Some("metals".to_string()),
            sub_sector: None,
            headquarters_country: "US".to_string(),
            headquarters_city: Some("Pittsburgh".to_string()),
            incorporation_country: Some("US".to_string()),
            market_cap: Some(12_000.0),
            revenue: Some(8_000.0),
            employees: Some(21_000),
            fortune_500_rank: None,
            business_model: None,
            primary_markets: vec!["US".to_string(), "EU".to_string()],
            supply_chain_exposure: vec![],
            regulatory_jurisdictions: vec!["US".to_string(), "CA".to_string()],
            compliance_requirements: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn metrics_on(company_id: Uuid, date: NaiveDate, revenue: f64) -> FinancialMetrics {
        FinancialMetrics {
            id: Uuid::new_v4(),
            company_id,
            date,
            total_revenue: Some(revenue),
            revenue_growth: None,
            net_income: None,
            operating_income: None,
            ebitda: None,
            profit_margin: None,
            total_assets: None,
            total_liabilities: None,
            shareholders_equity: None,
            debt_to_equity: None,
            operating_cash_flow: None,
            free_cash_flow: None,
            market_cap: None,
            enterprise_value: None,
            pe_ratio: None,
            pb_ratio: None,
            tier_1_capital: None,
            capital_adequacy_ratio: None,
            effective_tax_rate: None,
            tax_expense: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn valid_company_passes() {
        assert!(sample_company().validate().is_ok());
    }

    #[test]
    fn blank_industry_rejected() {
        let mut c = sample_company();
        c.industry = " ".to_string();
        assert_eq!(c.validate(), Err(ValidationError::EmptyField("industry")));
    }

    #[test]
    fn negative_revenue_rejected() {
        let mut c = sample_company();
        c.revenue = Some(-1.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn presence_checks_markets_and_regulators() {
        let c = sample_company();
        assert!(c.has_presence_in("eu"));
        assert!(c.has_presence_in("CA"));
        assert!(!c.has_presence_in("JP"));
    }

    #[test]
    fn latest_metrics_by_date() {
        let id = Uuid::new_v4();
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        let all = vec![
            metrics_on(id, d(3), 10.0),
            metrics_on(id, d(9), 30.0),
            metrics_on(id, d(6), 20.0),
        ];
        assert_eq!(FinancialMetrics::latest(&all).unwrap().total_revenue, Some(30.0));
        assert!(FinancialMetrics::latest(&[]).is_none());
    }

    #[test]
    fn profile_exposure_bounded() {
        let profile = CompanyProfile {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            description: None,
            ceo: None,
            website: None,
            esg_rating: None,
            carbon_footprint: None,
            risk_tolerance: Some(RiskTolerance::Medium),
            political_exposure: Some(1.1),
            regulatory_risk_score: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(profile.validate().is_err());
    }
}
