//! # Export
//!
//! Writes a [`Dataset`] as one pretty-printed `{set}.json` per entity set,
//! a flat CSV for the tabular sets (policies, companies, market data,
//! indicators, trade flows, assessments), and `generation_summary.json`.
//!
//! CSV rows flatten list fields into `;`-joined strings. The JSON files are
//! the canonical form; [`Dataset::load_dir`] reads only those.

use std::fs;
use std::path::Path;

use radar_core::{Company, ImpactAssessment, MarketData, Policy, TradeFlow};
use serde::Serialize;

use crate::dataset::{Dataset, DatasetSummary, SUMMARY_FILE};
use crate::error::SynthError;

/// Write `dataset` and `summary` into `dir`, creating it if needed.
/// Existing files with the same names are overwritten.
pub fn write_dir(
    dataset: &Dataset,
    dir: &Path,
    summary: &DatasetSummary,
) -> Result<(), SynthError> {
    fs::create_dir_all(dir).map_err(|e| SynthError::io(dir, e))?;

    write_json(dir, "policy_categories", &dataset.policy_categories)?;
    write_json(dir, "policies", &dataset.policies)?;
    write_json(dir, "policy_changes", &dataset.policy_changes)?;
    write_json(dir, "companies", &dataset.companies)?;
    write_json(dir, "company_profiles", &dataset.company_profiles)?;
    write_json(dir, "financial_metrics", &dataset.financial_metrics)?;
    write_json(dir, "market_data", &dataset.market_data)?;
    write_json(dir, "economic_indicators", &dataset.economic_indicators)?;
    write_json(dir, "trade_flows", &dataset.trade_flows)?;
    write_json(dir, "impact_assessments", &dataset.impact_assessments)?;

    write_csv(dir, "policies", dataset.policies.iter().map(PolicyRow::from))?;
    write_csv(dir, "companies", dataset.companies.iter().map(CompanyRow::from))?;
    write_csv(dir, "market_data", dataset.market_data.iter().map(MarketRow::from))?;
    write_csv(dir, "economic_indicators", dataset.economic_indicators.iter())?;
    write_csv(dir, "trade_flows", dataset.trade_flows.iter().map(TradeRow::from))?;
    write_csv(
        dir,
        "impact_assessments",
        dataset.impact_assessments.iter().map(AssessmentRow::from),
    )?;

    let path = dir.join(SUMMARY_FILE);
    let bytes = serde_json::to_vec_pretty(summary).map_err(|e| SynthError::json(&path, e))?;
    fs::write(&path, bytes).map_err(|e| SynthError::io(&path, e))?;

    tracing::info!(
        dir = %dir.display(),
        total_records = summary.total_records,
        "dataset exported"
    );
    Ok(())
}

fn write_json<T: Serialize>(dir: &Path, name: &str, records: &[T]) -> Result<(), SynthError> {
    let path = dir.join(format!("{name}.json"));
    let bytes = serde_json::to_vec_pretty(records).map_err(|e| SynthError::json(&path, e))?;
    fs::write(&path, bytes).map_err(|e| SynthError::io(&path, e))
}

fn write_csv<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: impl Iterator<Item = T>,
) -> Result<(), SynthError> {
    let path = dir.join(format!("{name}.csv"));
    let mut writer = csv::Writer::from_path(&path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| SynthError::io(&path, e))
}

fn joined(items: &[String]) -> String {
    items.join(";")
}

// ---------------------------------------------------------------------------
// Flat rows
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PolicyRow<'a> {
    id: String,
    title: &'a str,
    policy_number: &'a str,
    jurisdiction: &'a str,
    policy_type: &'static str,
    status: &'static str,
    proposed_date: Option<String>,
    enacted_date: Option<String>,
    effective_date: Option<String>,
    estimated_impact: Option<f64>,
    impact_confidence: Option<f64>,
    affected_industries: String,
    category_id: Option<String>,
}

impl<'a> From<&'a Policy> for PolicyRow<'a> {
    fn from(p: &'a Policy) -> Self {
        Self {
            id: p.id.to_string(),
            title: &p.title,
            policy_number: &p.policy_number,
            jurisdiction: p.jurisdiction.as_str(),
            policy_type: p.policy_type.as_str(),
            status: p.status.as_str(),
            proposed_date: p.proposed_date.map(|d| d.to_rfc3339()),
            enacted_date: p.enacted_date.map(|d| d.to_rfc3339()),
            effective_date: p.effective_date.map(|d| d.to_rfc3339()),
            estimated_impact: p.estimated_impact,
            impact_confidence: p.impact_confidence,
            affected_industries: joined(&p.affected_industries),
            category_id: p.category_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Serialize)]
struct CompanyRow<'a> {
    id: String,
    name: &'a str,
    ticker: Option<&'a str>,
    industry: &'a str,
    sector: Option<&'a str>,
    headquarters_country: &'a str,
    market_cap: Option<f64>,
    revenue: Option<f64>,
    employees: Option<u32>,
    primary_markets: String,
    regulatory_jurisdictions: String,
}

impl<'a> From<&'a Company> for CompanyRow<'a> {
    fn from(c: &'a Company) -> Self {
        Self {
            id: c.id.to_string(),
            name: &c.name,
            ticker: c.ticker.as_deref(),
            industry: &c.industry,
            sector: c.sector.as_deref(),
            headquarters_country: &c.headquarters_country,
            market_cap: c.market_cap,
            revenue: c.revenue,
            employees: c.employees,
            primary_markets: joined(&c.primary_markets),
            regulatory_jurisdictions: joined(&c.regulatory_jurisdictions),
        }
    }
}

#[derive(Serialize)]
struct MarketRow<'a> {
    symbol: &'a str,
    exchange: Option<&'a str>,
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<u64>,
    daily_return: Option<f64>,
    volatility: Option<f64>,
}

impl<'a> From<&'a MarketData> for MarketRow<'a> {
    fn from(m: &'a MarketData) -> Self {
        Self {
            symbol: &m.symbol,
            exchange: m.exchange.as_deref(),
            date: m.date.to_string(),
            open: m.open_price,
            high: m.high_price,
            low: m.low_price,
            close: m.close_price,
            volume: m.volume,
            daily_return: m.daily_return,
            volatility: m.volatility,
        }
    }
}

#[derive(Serialize)]
struct TradeRow<'a> {
    trade_id: &'a str,
    trade_type: &'static str,
    origin_country: &'a str,
    destination_country: &'a str,
    transit_countries: String,
    product_category: &'a str,
    date: String,
    quantity: Option<f64>,
    value_usd: f64,
    tariff_rate: Option<f64>,
    duty_amount: Option<f64>,
    transport_mode: Option<&'a str>,
    transit_time_days: Option<u32>,
}

impl<'a> From<&'a TradeFlow> for TradeRow<'a> {
    fn from(f: &'a TradeFlow) -> Self {
        Self {
            trade_id: &f.trade_id,
            trade_type: f.trade_type.as_str(),
            origin_country: &f.origin_country,
            destination_country: &f.destination_country,
            transit_countries: joined(&f.transit_countries),
            product_category: &f.product_category,
            date: f.date.to_string(),
            quantity: f.quantity,
            value_usd: f.value_usd,
            tariff_rate: f.tariff_rate,
            duty_amount: f.duty_amount,
            transport_mode: f.transport_mode.as_deref(),
            transit_time_days: f.transit_time_days,
        }
    }
}

#[derive(Serialize)]
struct AssessmentRow<'a> {
    id: String,
    policy_id: String,
    company_id: String,
    assessment_period: &'a str,
    scenario: &'static str,
    overall_impact: f64,
    confidence_level: f64,
    confidence_interval_lower: f64,
    confidence_interval_upper: f64,
    revenue_impact: f64,
    cost_impact: f64,
    capital_impact: f64,
    tax_impact: f64,
    risk_level: &'static str,
    risk_score: f64,
    risk_factors: String,
    model_version: &'a str,
}

impl<'a> From<&'a ImpactAssessment> for AssessmentRow<'a> {
    fn from(a: &'a ImpactAssessment) -> Self {
        Self {
            id: a.id.to_string(),
            policy_id: a.policy_id.to_string(),
            company_id: a.company_id.to_string(),
            assessment_period: a.assessment_period.as_str(),
            scenario: a.scenario.as_str(),
            overall_impact: a.overall_impact,
            confidence_level: a.confidence_level,
            confidence_interval_lower: a.confidence_interval_lower,
            confidence_interval_upper: a.confidence_interval_upper,
            revenue_impact: a.revenue_impact,
            cost_impact: a.cost_impact,
            capital_impact: a.capital_impact,
            tax_impact: a.tax_impact,
            risk_level: a.risk_level.as_str(),
            risk_score: a.risk_score,
            risk_factors: joined(&a.risk_factors),
            model_version: &a.model_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::dataset::read_summary;
    use crate::generator::SyntheticGenerator;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tiny() -> (GeneratorConfig, Dataset) {
        let config = GeneratorConfig {
            seed: 11,
            policies: 12,
            companies: 10,
            market_days: 5,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            max_companies_per_policy: 3,
            workers: 1,
        };
        let data = SyntheticGenerator::new(config.clone()).unwrap().generate().unwrap();
        (config, data)
    }

    #[test]
    fn written_dir_loads_back() {
        let (config, data) = tiny();
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let summary = data.summary(config.seed, config.start, config.end, at);
        write_dir(&data, dir.path(), &summary).unwrap();

        let loaded = Dataset::load_dir(dir.path()).unwrap();
        assert_eq!(loaded.counts(), data.counts());
        let ids = |d: &Dataset| d.policies.iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(&loaded), ids(&data));
        assert_eq!(loaded.companies[0].name, data.companies[0].name);
        assert_eq!(loaded.trade_flows, data.trade_flows);
        assert_eq!(read_summary(dir.path()).unwrap(), Some(summary));
    }

    #[test]
    fn csv_has_one_row_per_record() {
        let (config, data) = tiny();
        let dir = tempfile::tempdir().unwrap();
        let summary = data.summary(config.seed, config.start, config.end, Utc::now());
        write_dir(&data, dir.path(), &summary).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("policies.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == "affected_industries"));
        assert_eq!(reader.records().count(), data.policies.len());

        let mut reader = csv::Reader::from_path(dir.path().join("market_data.csv")).unwrap();
        assert_eq!(reader.records().count(), data.market_data.len());

        let mut reader = csv::Reader::from_path(dir.path().join("trade_flows.csv")).unwrap();
        assert_eq!(reader.records().count(), data.trade_flows.len());
    }

    #[test]
    fn creates_missing_directory() {
        let (config, data) = tiny();
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let summary = data.summary(config.seed, config.start, config.end, Utc::now());
        write_dir(&data, &nested, &summary).unwrap();
        assert!(nested.join("generation_summary.json").is_file());
    }
}
