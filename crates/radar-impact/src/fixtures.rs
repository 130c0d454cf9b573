//! Shared test records.

use chrono::{NaiveDate, TimeZone, Utc};
use radar_core::{
    Company, CompanyProfile, FinancialMetrics, JurisdictionCode, Policy, PolicyStatus, PolicyType,
    RiskTolerance,
};
use uuid::Uuid;

pub(crate) fn policy() -> Policy {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    Policy {
        id: Uuid::new_v4(),
        title: "Carbon Border Adjustment".to_string(),
        description: None,
        policy_number: "EU-ENV-0001".to_string(),
        jurisdiction: JurisdictionCode::new("EU").unwrap(),
        policy_type: PolicyType::Regulation,
        status: PolicyStatus::Enacted,
        proposed_date: Some(at),
        enacted_date: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
        effective_date: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        expiration_date: None,
        regulatory_body: None,
        authority: None,
        content_summary: None,
        full_text_url: None,
        source_url: None,
        estimated_impact: Some(-400.0),
        impact_confidence: Some(0.8),
        affected_industries: vec!["manufacturing".to_string(), "energy".to_string()],
        category_id: None,
        created_at: at,
        updated_at: at,
    }
}

pub(crate) fn company() -> Company {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Company {
        id: Uuid::new_v4(),
        name: "Northwind Steel".to_string(),
        ticker: Some("NWS".to_string()),
        isin: None,
        cusip: None,
        industry: "manufacturing".to_string(),
        sector: None,
        sub_sector: None,
        headquarters_country: "US".to_string(),
        headquarters_city: None,
        incorporation_country: None,
        market_cap: Some(12_000.0),
        revenue: Some(8_000.0),
        employees: None,
        fortune_500_rank: None,
        business_model: None,
        primary_markets: vec!["US".to_string(), "EU".to_string()],
        supply_chain_exposure: vec![],
        regulatory_jurisdictions: vec!["US".to_string()],
        compliance_requirements: vec![],
        created_at: at,
        updated_at: at,
    }
}

pub(crate) fn profile(company_id: Uuid, political_exposure: f64) -> CompanyProfile {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    CompanyProfile {
        id: Uuid::new_v4(),
        company_id,
        description: None,
        ceo: None,
        website: None,
        esg_rating: None,
        carbon_footprint: None,
        risk_tolerance: Some(RiskTolerance::Medium),
        political_exposure: Some(political_exposure),
        regulatory_risk_score: None,
        created_at: at,
        updated_at: at,
    }
}

pub(crate) fn metrics(company_id: Uuid, total_revenue: f64) -> FinancialMetrics {
    FinancialMetrics {
        id: Uuid::new_v4(),
        company_id,
        date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        total_revenue: Some(total_revenue),
        revenue_growth: None,
        net_income: None,
        operating_income: None,
        ebitda: None,
        profit_margin: None,
        total_assets: None,
        total_liabilities: None,
        shareholders_equity: None,
        debt_to_equity: Some(1.2),
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
        created_at: Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
    }
}
