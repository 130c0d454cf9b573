//! # Synthetic Generator
//!
//! Builds a complete, internally consistent [`Dataset`] from a
//! [`GeneratorConfig`]. Every random draw comes from one
//! `StdRng::seed_from_u64(seed)` stream in a fixed order, and record IDs
//! are drawn from the same stream, so a seed reproduces the dataset
//! byte for byte.
//!
//! Impact assessments are not sampled. They are computed by running
//! [`ImpactEngine`] over (policy, company) pairs where the company operates
//! in the policy's jurisdiction and industry.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use radar_core::{
    AssessmentPeriod, CategoryGroup, ChangeType, Company, CompanyProfile, EconomicIndicator,
    FinancialMetrics, Frequency, ImpactAssessment, JurisdictionCode, MarketData, Policy,
    PolicyCategory, PolicyChange, PolicyStatus, PolicyType, RiskTolerance, Scenario,
    TradeFlow, TradeType,
};
use radar_impact::{AssessmentInput, AssessmentJob, AssessmentRequest, ImpactEngine};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::dataset::Dataset;
use crate::error::SynthError;

/// Policy categories with their descriptions.
pub const CATEGORIES: [(&str, &str); 10] = [
    ("Trade Policy", "International trade regulations and agreements"),
    ("Financial Regulation", "Banking and financial services regulations"),
    ("Environmental Policy", "Environmental protection and climate regulations"),
    ("Tax Policy", "Corporate and individual tax regulations"),
    ("Labor Law", "Employment and workplace regulations"),
    ("Technology Regulation", "Digital and technology sector regulations"),
    ("Healthcare Policy", "Healthcare and pharmaceutical regulations"),
    ("Energy Policy", "Energy sector regulations and incentives"),
    ("Data Privacy", "Data protection and privacy regulations"),
    ("Antitrust", "Competition and antitrust regulations"),
];

/// Jurisdictions policies and companies are drawn from.
pub const JURISDICTIONS: [&str; 10] = ["US", "EU", "UK", "JP", "CN", "CA", "AU", "IN", "BR", "MX"];

/// Industries with a dedicated risk model.
pub const MODELLED_INDUSTRIES: [&str; 5] = [
    "financial_services",
    "technology",
    "energy",
    "healthcare",
    "manufacturing",
];

/// Symbols with daily prices.
pub const SYMBOLS: [&str; 10] = [
    "AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "JPM", "BAC", "WMT", "JNJ", "PG",
];

const NASDAQ: [&str; 5] = ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"];

/// (name, code, category, unit, is_rate)
const INDICATORS: [(&str, &str, &str, &str, bool); 5] = [
    ("GDP Growth Rate", "GDP_GROWTH", "gdp", "percent", true),
    ("Inflation Rate", "INFLATION", "inflation", "percent", true),
    ("Unemployment Rate", "UNEMPLOYMENT", "employment", "percent", true),
    ("Interest Rate", "INTEREST_RATE", "monetary", "percent", true),
    ("Consumer Price Index", "CPI", "inflation", "index", false),
];

const INDICATOR_COUNTRIES: [&str; 5] = ["US", "EU", "UK", "JP", "CN"];

const TRADE_COUNTRIES: [&str; 10] = ["US", "EU", "UK", "JP", "CN", "CA", "AU", "IN", "BR", "MX"];
const TRADE_PRODUCTS: [&str; 6] = [
    "electronics",
    "automotive",
    "pharmaceuticals",
    "energy",
    "agriculture",
    "textiles",
];
const TRANSPORT_MODES: [&str; 4] = ["sea", "air", "land", "rail"];
const FLOWS_PER_COMPANY: usize = 10;

const TITLE_TEMPLATES: [&str; 10] = [
    "Enhanced Capital Requirements for",
    "Environmental Compliance Standards for",
    "Data Protection Regulations for",
    "Trade Tariff Adjustments for",
    "Tax Incentive Program for",
    "Workplace Safety Standards for",
    "Supply Chain Transparency Requirements for",
    "Digital Transformation Mandates for",
    "Sustainability Reporting Requirements for",
    "Cybersecurity Standards for",
];

const COMPANY_NAMES: [&str; 20] = [
    "GlobalTech Solutions",
    "MegaBank International",
    "GreenEnergy Corp",
    "HealthCare Plus",
    "Manufacturing Dynamics",
    "Digital Innovations",
    "Financial Services Group",
    "Energy Solutions",
    "Pharmaceutical Research",
    "Technology Systems",
    "Industrial Manufacturing",
    "Consumer Goods Co",
    "Telecommunications Network",
    "Transportation Logistics",
    "Real Estate Holdings",
    "Utilities Corp",
    "Materials Processing",
    "Aerospace Defense",
    "Biotechnology Research",
    "Automotive Systems",
];

const POLICY_TYPES: [PolicyType; 4] = [
    PolicyType::Legislation,
    PolicyType::Regulation,
    PolicyType::ExecutiveOrder,
    PolicyType::Guidance,
];

const ENACTED_PROBABILITY: f64 = 0.7;
const METRICS_STEP_DAYS: i64 = 90;
const DAILY_VOLATILITY: f64 = 0.02;
const DAILY_DRIFT: f64 = 0.0003;

/// Seeded dataset generator.
pub struct SyntheticGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl SyntheticGenerator {
    /// Generator for `config`.
    pub fn new(config: GeneratorConfig) -> Result<Self, SynthError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    /// Configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce the full dataset. Consumes the generator so the RNG stream
    /// cannot be reused.
    pub fn generate(mut self) -> Result<Dataset, SynthError> {
        let mut data = Dataset {
            policy_categories: self.categories(),
            ..Dataset::default()
        };
        data.policies = self.policies(&data.policy_categories)?;
        data.policy_changes = self.policy_changes(&data.policies);
        data.companies = self.companies();
        data.company_profiles = self.profiles(&data.companies);
        data.financial_metrics = self.financial_metrics(&data.companies);
        data.market_data = self.market_data();
        data.economic_indicators = self.economic_indicators();
        data.trade_flows = self.trade_flows(&data.companies);
        data.impact_assessments = self.assessments(&data);

        tracing::info!(
            seed = self.config.seed,
            policies = data.policies.len(),
            companies = data.companies.len(),
            market_rows = data.market_data.len(),
            trade_flows = data.trade_flows.len(),
            assessments = data.impact_assessments.len(),
            "synthetic dataset generated"
        );
        Ok(data)
    }

    // -----------------------------------------------------------------------
    // Draw helpers
    // -----------------------------------------------------------------------

    fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.gen_range(0..items.len())]
    }

    fn date_between(&mut self, from: NaiveDate, to: NaiveDate) -> NaiveDate {
        let span = (to - from).num_days().max(0);
        from + Duration::days(self.rng.gen_range(0..=span))
    }

    fn start_of_range(&self) -> DateTime<Utc> {
        midnight(self.config.start)
    }

    // -----------------------------------------------------------------------
    // Policies
    // -----------------------------------------------------------------------

    fn categories(&mut self) -> Vec<PolicyCategory> {
        let at = self.start_of_range();
        CATEGORIES
            .iter()
            .map(|(name, description)| PolicyCategory {
                id: self.uuid(),
                name: name.to_string(),
                description: Some(description.to_string()),
                parent_category_id: None,
                group: CategoryGroup::classify(name),
                created_at: at,
                updated_at: at,
            })
            .collect()
    }

    fn policies(&mut self, categories: &[PolicyCategory]) -> Result<Vec<Policy>, SynthError> {
        let mut out = Vec::with_capacity(self.config.policies);
        for i in 0..self.config.policies {
            let jurisdiction = self.pick(&JURISDICTIONS);
            let category = &categories[self.rng.gen_range(0..categories.len())];
            let industry_count = self.rng.gen_range(1..=3);
            let industries: Vec<String> = MODELLED_INDUSTRIES
                .choose_multiple(&mut self.rng, industry_count)
                .map(|s| s.to_string())
                .collect();
            let policy_type = self.pick(&POLICY_TYPES);

            let proposed = self.date_between(self.config.start, self.config.end);
            let enacted = if self.rng.gen_bool(ENACTED_PROBABILITY) {
                Some(proposed + Duration::days(self.rng.gen_range(30..=365)))
            } else {
                None
            };
            let effective = enacted.map(|d| d + Duration::days(self.rng.gen_range(0..=180)));
            let status = match enacted {
                Some(_) if self.rng.gen_bool(0.5) => PolicyStatus::Implemented,
                Some(_) => PolicyStatus::Enacted,
                None if self.rng.gen_bool(0.8) => PolicyStatus::Proposed,
                None => PolicyStatus::Draft,
            };
            let template = self.pick(&TITLE_TEMPLATES);
            let lead = industries.first().map(String::as_str).unwrap_or("industry");
            let proposed_at = midnight(proposed);

            out.push(Policy {
                id: self.uuid(),
                title: format!("{template} {}", display_industry(lead)),
                description: Some(format!(
                    "Comprehensive regulatory framework for the {} sector",
                    lead.replace('_', " ")
                )),
                policy_number: format!(
                    "{jurisdiction}-{}-{:04}",
                    category_code(&category.name),
                    i + 1
                ),
                jurisdiction: JurisdictionCode::new(jurisdiction).map_err(|source| {
                    SynthError::Invalid { file: "policies", index: i, source }
                })?,
                policy_type,
                status,
                proposed_date: Some(proposed_at),
                enacted_date: enacted.map(midnight),
                effective_date: effective.map(midnight),
                expiration_date: None,
                regulatory_body: Some(format!("{jurisdiction} Regulatory Authority")),
                authority: None,
                content_summary: Some(format!(
                    "{} measures affecting {}",
                    category.name,
                    industries.join(", ")
                )),
                full_text_url: None,
                source_url: None,
                estimated_impact: Some(self.rng.gen_range(-500.0..500.0)),
                impact_confidence: Some(self.rng.gen_range(0.5..0.9)),
                affected_industries: industries,
                category_id: Some(category.id),
                created_at: proposed_at,
                updated_at: proposed_at,
            });
        }
        Ok(out)
    }

    fn policy_changes(&mut self, policies: &[Policy]) -> Vec<PolicyChange> {
        let mut out = Vec::new();
        for policy in policies {
            let from = policy.reference_date().date_naive();
            for n in 0..self.rng.gen_range(1..=3) {
                let date = self.date_between(from, self.config.end.max(from));
                let at = midnight(date);
                let magnitude: f64 = self.rng.gen_range(-1.0..=1.0);
                out.push(PolicyChange {
                    id: self.uuid(),
                    policy_id: policy.id,
                    change_type: self.pick(&ChangeType::ALL),
                    change_date: at,
                    change_description: Some(format!("Modification to {}", policy.title)),
                    impact_magnitude: Some(magnitude),
                    impact_direction: Some(direction_label(magnitude).to_string()),
                    source_document: Some(format!("Amendment-{}-{}", policy.policy_number, n + 1)),
                    legislative_session: Some(format!("Session-{}", date.year())),
                    created_at: at,
                });
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Companies
    // -----------------------------------------------------------------------

    fn companies(&mut self) -> Vec<Company> {
        let at = self.start_of_range();
        (0..self.config.companies)
            .map(|i| {
                let industry = self.pick(&MODELLED_INDUSTRIES);
                let home = self.pick(&JURISDICTIONS);
                let market = self.other_jurisdiction(home);
                let regulator = self.other_jurisdiction(home);
                let base = self.pick(&COMPANY_NAMES);
                let fortune_500_rank =
                    (self.rng.gen::<f64>() > 0.7).then(|| self.rng.gen_range(1..500));
                Company {
                    id: self.uuid(),
                    name: format!("{base} {}", i + 1),
                    ticker: Some(format!("TICK{:03}", i + 1)),
                    isin: None,
                    cusip: None,
                    industry: industry.to_string(),
                    sector: Some(display_industry(industry)),
                    sub_sector: None,
                    headquarters_country: home.to_string(),
                    headquarters_city: None,
                    incorporation_country: Some(home.to_string()),
                    market_cap: Some(self.rng.gen_range(1000.0..50000.0)),
                    revenue: Some(self.rng.gen_range(500.0..25000.0)),
                    employees: Some(self.rng.gen_range(1000..100_000)),
                    fortune_500_rank,
                    business_model: None,
                    primary_markets: vec![home.to_string(), market.to_string()],
                    supply_chain_exposure: Vec::new(),
                    regulatory_jurisdictions: vec![home.to_string(), regulator.to_string()],
                    compliance_requirements: Vec::new(),
                    created_at: at,
                    updated_at: at,
                }
            })
            .collect()
    }

    fn other_jurisdiction(&mut self, home: &str) -> &'static str {
        loop {
            let j = self.pick(&JURISDICTIONS);
            if j != home {
                return j;
            }
        }
    }

    fn profiles(&mut self, companies: &[Company]) -> Vec<CompanyProfile> {
        let at = self.start_of_range();
        companies
            .iter()
            .map(|c| CompanyProfile {
                id: self.uuid(),
                company_id: c.id,
                description: Some(format!("Leading {} company", c.industry.replace('_', " "))),
                ceo: Some(format!("CEO of {}", c.name)),
                website: Some(format!(
                    "https://www.{}.com",
                    c.name.to_lowercase().replace(' ', "")
                )),
                esg_rating: Some(self.pick(&["A", "B", "C", "D"]).to_string()),
                carbon_footprint: Some(self.rng.gen_range(1000.0..50000.0)),
                risk_tolerance: Some(self.pick(&[
                    RiskTolerance::Low,
                    RiskTolerance::Medium,
                    RiskTolerance::High,
                ])),
                political_exposure: Some(self.rng.gen_range(0.1..0.9)),
                regulatory_risk_score: Some(self.rng.gen_range(0.1..0.9)),
                created_at: at,
                updated_at: at,
            })
            .collect()
    }

    fn financial_metrics(&mut self, companies: &[Company]) -> Vec<FinancialMetrics> {
        let noise = Normal::<f64>::new(0.0, 0.05).ok();
        let cap_noise = Normal::<f64>::new(0.0, 0.1).ok();
        let mut out = Vec::new();
        for company in companies {
            let base_revenue = company.revenue.unwrap_or(1000.0);
            let base_cap = company.market_cap.unwrap_or(5000.0);
            let banking = company.industry == "financial_services";
            let mut date = self.config.start;
            while date <= self.config.end {
                let shock = noise.map_or(0.0, |n| n.sample(&mut self.rng));
                let revenue = base_revenue * (1.0 + shock);
                let net_income = revenue * self.rng.gen_range(0.05..0.25);
                let operating_income = net_income * self.rng.gen_range(1.1..1.5);
                let total_assets = revenue * self.rng.gen_range(1.5..3.0);
                let total_liabilities = total_assets * self.rng.gen_range(0.3..0.7);
                let equity = total_assets - total_liabilities;
                let tax_rate = self.rng.gen_range(0.15..0.35);
                let cap_shock = cap_noise.map_or(0.0, |n| n.sample(&mut self.rng));
                out.push(FinancialMetrics {
                    id: self.uuid(),
                    company_id: company.id,
                    date,
                    total_revenue: Some(revenue),
                    revenue_growth: Some(self.rng.gen_range(-0.1..0.2)),
                    net_income: Some(net_income),
                    operating_income: Some(operating_income),
                    ebitda: Some(operating_income * self.rng.gen_range(1.05..1.2)),
                    profit_margin: Some(net_income / revenue),
                    total_assets: Some(total_assets),
                    total_liabilities: Some(total_liabilities),
                    shareholders_equity: Some(equity),
                    debt_to_equity: Some(if equity > 0.0 {
                        total_liabilities / equity
                    } else {
                        0.0
                    }),
                    operating_cash_flow: Some(operating_income * self.rng.gen_range(0.8..1.2)),
                    free_cash_flow: Some(operating_income * self.rng.gen_range(0.6..1.0)),
                    market_cap: Some(base_cap * (1.0 + cap_shock)),
                    enterprise_value: None,
                    pe_ratio: Some(self.rng.gen_range(10.0..30.0)),
                    pb_ratio: None,
                    tier_1_capital: banking.then(|| equity * 0.8),
                    capital_adequacy_ratio: banking.then(|| equity / total_assets * 100.0),
                    effective_tax_rate: Some(tax_rate),
                    tax_expense: Some(net_income * tax_rate),
                    created_at: midnight(date),
                });
                date += Duration::days(METRICS_STEP_DAYS);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Markets
    // -----------------------------------------------------------------------

    fn market_data(&mut self) -> Vec<MarketData> {
        let Ok(returns) = Normal::new(DAILY_DRIFT, DAILY_VOLATILITY) else {
            return Vec::new();
        };
        let Ok(wick) = Normal::<f64>::new(0.0, 0.005) else {
            return Vec::new();
        };
        let days = trading_days(self.config.start, self.config.end, self.config.market_days);
        let mut out = Vec::with_capacity(days.len() * SYMBOLS.len());
        for symbol in SYMBOLS {
            let mut close: f64 = self.rng.gen_range(50.0..500.0);
            let shares: f64 = self.rng.gen_range(1000.0..50000.0) / close;
            let mut window: Vec<f64> = Vec::new();
            for &date in &days {
                let open = close;
                let r: f64 = returns.sample(&mut self.rng);
                close = open * r.exp();
                let high = open.max(close) * (1.0 + wick.sample(&mut self.rng).abs());
                let low = open.min(close) * (1.0 - wick.sample(&mut self.rng).abs());
                window.push(r);
                if window.len() > 20 {
                    window.remove(0);
                }
                out.push(MarketData {
                    id: self.uuid(),
                    symbol: symbol.to_string(),
                    asset_type: "stock".to_string(),
                    exchange: Some(
                        if NASDAQ.contains(&symbol) { "NASDAQ" } else { "NYSE" }.to_string(),
                    ),
                    date,
                    open_price: Some(open),
                    high_price: Some(high),
                    low_price: Some(low),
                    close_price: close,
                    adjusted_close: Some(close),
                    volume: Some(self.rng.gen_range(1_000_000..10_000_000)),
                    daily_return: Some(close / open - 1.0),
                    volatility: annualised_std(&window),
                    market_cap: Some(close * shares),
                    pe_ratio: None,
                    dividend_yield: None,
                    data_source: Some("synthetic".to_string()),
                    created_at: midnight(date),
                });
            }
        }
        out
    }

    fn economic_indicators(&mut self) -> Vec<EconomicIndicator> {
        let mut out = Vec::new();
        for country in INDICATOR_COUNTRIES {
            for (name, code, category, unit, is_rate) in INDICATORS {
                let mut previous: Option<f64> = None;
                for year in self.config.start.year()..=self.config.end.year() {
                    for quarter in 1..=4 {
                        let Some(date) = NaiveDate::from_ymd_opt(year, quarter * 3, 1) else {
                            continue;
                        };
                        if date < self.config.start || date > self.config.end {
                            continue;
                        }
                        let value = if is_rate {
                            self.rng.gen_range(0.0..10.0)
                        } else {
                            self.rng.gen_range(100.0..300.0)
                        };
                        out.push(EconomicIndicator {
                            id: self.uuid(),
                            indicator_name: name.to_string(),
                            indicator_code: code.to_string(),
                            category: Some(category.to_string()),
                            country: country.to_string(),
                            date,
                            frequency: Frequency::Quarterly,
                            value,
                            previous_value: previous,
                            change: previous.map(|p| value - p),
                            unit: Some(unit.to_string()),
                            source_agency: Some(format!("{country} Bureau of Statistics")),
                            created_at: midnight(date),
                        });
                        previous = Some(value);
                    }
                }
            }
        }
        out
    }

    fn trade_flows(&mut self, companies: &[Company]) -> Vec<TradeFlow> {
        if companies.is_empty() {
            return Vec::new();
        }
        let count = companies.len() * FLOWS_PER_COMPANY;
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let company = &companies[self.rng.gen_range(0..companies.len())];
            let origin = company.headquarters_country.clone();
            let destinations: Vec<&str> = TRADE_COUNTRIES
                .iter()
                .copied()
                .filter(|c| !c.eq_ignore_ascii_case(&origin))
                .collect();
            let destination = self.pick(&destinations);
            let date = self.date_between(self.config.start, self.config.end);
            let trade_type = if self.rng.gen_bool(0.5) {
                TradeType::Import
            } else {
                TradeType::Export
            };
            let exporter = self.rng.gen_bool(0.5).then(|| company.name.clone());
            let importer = self.rng.gen_bool(0.5).then(|| company.name.clone());
            out.push(TradeFlow {
                id: self.uuid(),
                trade_id: format!("TRADE_{:06}", i + 1),
                trade_type,
                origin_country: origin,
                destination_country: destination.to_string(),
                transit_countries: Vec::new(),
                product_category: self.pick(&TRADE_PRODUCTS).to_string(),
                product_code: None,
                product_description: None,
                date,
                quantity: Some(self.rng.gen_range(100.0..10_000.0)),
                quantity_unit: Some("units".to_string()),
                value_usd: self.rng.gen_range(10_000.0..1_000_000.0),
                value_local: None,
                local_currency: None,
                tariff_rate: Some(self.rng.gen_range(0.0..0.25)),
                duty_amount: Some(self.rng.gen_range(0.0..50_000.0)),
                preferential_treatment: false,
                transport_mode: Some(self.pick(&TRANSPORT_MODES).to_string()),
                shipping_route: None,
                transit_time_days: Some(self.rng.gen_range(1..=30)),
                exporter_company: exporter,
                importer_company: importer,
                affected_by_policies: Vec::new(),
                policy_impact_amount: None,
                data_source: Some("Customs Authority".to_string()),
                created_at: midnight(date),
            });
        }
        out
    }

    // -----------------------------------------------------------------------
    // Assessments
    // -----------------------------------------------------------------------

    fn assessments(&mut self, data: &Dataset) -> Vec<ImpactAssessment> {
        let groups: HashMap<Uuid, CategoryGroup> =
            data.policy_categories.iter().map(|c| (c.id, c.group)).collect();
        let profiles: HashMap<Uuid, &CompanyProfile> =
            data.company_profiles.iter().map(|p| (p.company_id, p)).collect();
        let mut metrics: HashMap<Uuid, Vec<FinancialMetrics>> = HashMap::new();
        for m in &data.financial_metrics {
            metrics.entry(m.company_id).or_default().push(m.clone());
        }

        let mut jobs = Vec::new();
        for policy in &data.policies {
            let group = policy
                .category_id
                .and_then(|id| groups.get(&id).copied())
                .unwrap_or(CategoryGroup::General);
            let mut candidates: Vec<&Company> = data
                .companies
                .iter()
                .filter(|c| policy.affects_industry(&c.industry))
                .filter(|c| c.has_presence_in(policy.jurisdiction.as_str()))
                .collect();
            candidates.shuffle(&mut self.rng);
            candidates.truncate(self.config.max_companies_per_policy);

            let as_of = policy.reference_date();
            let period = AssessmentPeriod::starting(as_of.year());
            for company in candidates {
                let known: Vec<FinancialMetrics> = metrics
                    .get(&company.id)
                    .map(|all| all.iter().filter(|m| midnight(m.date) <= as_of).cloned().collect())
                    .unwrap_or_default();
                let latest = FinancialMetrics::latest(&known).cloned();
                jobs.push((
                    policy,
                    group,
                    company,
                    latest,
                    AssessmentRequest {
                        id: self.uuid(),
                        scenario: Scenario::Baseline,
                        period: period.clone(),
                        assessment_date: as_of,
                    },
                ));
            }
        }

        let batch: Vec<AssessmentJob<'_>> = jobs
            .iter()
            .map(|(policy, group, company, latest, request)| AssessmentJob {
                input: AssessmentInput::new(policy, *group, company)
                    .with_profile(profiles.get(&company.id).copied())
                    .with_metrics(latest.as_ref()),
                request: request.clone(),
            })
            .collect();

        let engine = ImpactEngine::new(self.config.workers);
        engine
            .assess_batch(&batch)
            .into_iter()
            .zip(&batch)
            .filter_map(|(result, job)| match result {
                Ok(a) => Some(a),
                Err(e) => {
                    tracing::warn!(
                        policy_id = %job.input.policy.id,
                        company_id = %job.input.company.id,
                        error = %e,
                        "assessment skipped"
                    );
                    None
                }
            })
            .collect()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn display_industry(slug: &str) -> String {
    slug.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First three letters of the category name with spaces removed.
fn category_code(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase()
}

fn direction_label(magnitude: f64) -> &'static str {
    if magnitude > 0.1 {
        "positive"
    } else if magnitude < -0.1 {
        "negative"
    } else {
        "neutral"
    }
}

/// Up to `limit` weekdays ending at `end` (or fewer if `start` is reached).
fn trading_days(start: NaiveDate, end: NaiveDate, limit: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(limit);
    let mut d = end;
    while days.len() < limit && d >= start {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        match d.pred_opt() {
            Some(prev) => d = prev,
            None => break,
        }
    }
    days.reverse();
    days
}

fn annualised_std(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt() * 252f64.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GeneratorConfig {
        GeneratorConfig {
            seed: 7,
            policies: 40,
            companies: 30,
            market_days: 30,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            max_companies_per_policy: 5,
            workers: 2,
        }
    }

    #[test]
    fn same_seed_same_dataset() {
        let a = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        let b = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        assert_eq!(a, b);
        let c = SyntheticGenerator::new(GeneratorConfig { seed: 8, ..small() })
            .unwrap()
            .generate()
            .unwrap();
        assert_ne!(a.policies, c.policies);
    }

    #[test]
    fn records_are_valid() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        d.validate().unwrap();
        assert_eq!(d.policy_categories.len(), 10);
        assert_eq!(d.policies.len(), 40);
        assert_eq!(d.companies.len(), 30);
        assert_eq!(d.company_profiles.len(), 30);
    }

    #[test]
    fn policy_shape() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        for p in &d.policies {
            let parts: Vec<&str> = p.policy_number.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert!(JURISDICTIONS.contains(&parts[0]));
            assert_eq!(parts[1].len(), 3);
            assert_eq!(parts[2].len(), 4);
            assert!((1..=3).contains(&p.affected_industries.len()));
            let impact = p.estimated_impact.unwrap();
            assert!((-500.0..500.0).contains(&impact));
            let conf = p.impact_confidence.unwrap();
            assert!((0.5..0.9).contains(&conf));
            if let (Some(proposed), Some(enacted)) = (p.proposed_date, p.enacted_date) {
                assert!(enacted > proposed);
            }
        }
        let per_policy = d.policy_changes.len() as f64 / d.policies.len() as f64;
        assert!((1.0..=3.0).contains(&per_policy));
    }

    #[test]
    fn companies_have_two_markets() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        for c in &d.companies {
            assert!(c.ticker.as_deref().unwrap().starts_with("TICK"));
            assert_eq!(c.primary_markets.len(), 2);
            assert_ne!(c.primary_markets[0], c.primary_markets[1]);
            assert_eq!(c.regulatory_jurisdictions.len(), 2);
        }
        // Quarterly metrics over three years.
        let per_company = d.financial_metrics.len() / d.companies.len();
        assert_eq!(per_company, 13);
    }

    #[test]
    fn trade_flows_leave_the_home_country() {
        let config = small();
        let d = SyntheticGenerator::new(config.clone()).unwrap().generate().unwrap();
        assert_eq!(d.trade_flows.len(), d.companies.len() * FLOWS_PER_COMPANY);
        let homes: Vec<&str> = d
            .companies
            .iter()
            .map(|c| c.headquarters_country.as_str())
            .collect();
        for (i, f) in d.trade_flows.iter().enumerate() {
            assert_eq!(f.trade_id, format!("TRADE_{:06}", i + 1));
            assert!(homes.contains(&f.origin_country.as_str()));
            assert_ne!(f.origin_country, f.destination_country);
            assert!(TRADE_COUNTRIES.contains(&f.destination_country.as_str()));
            assert!(TRADE_PRODUCTS.contains(&f.product_category.as_str()));
            assert!((config.start..=config.end).contains(&f.date));
            assert!((0.0..0.25).contains(&f.tariff_rate.unwrap()));
            assert!((1..=30).contains(&f.transit_time_days.unwrap()));
        }
    }

    #[test]
    fn optional_company_fields_follow_industry() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        for c in &d.companies {
            if let Some(rank) = c.fortune_500_rank {
                assert!((1..500).contains(&rank));
            }
        }
        let industries: HashMap<Uuid, &str> =
            d.companies.iter().map(|c| (c.id, c.industry.as_str())).collect();
        for m in &d.financial_metrics {
            let bank = industries[&m.company_id] == "financial_services";
            assert_eq!(m.tier_1_capital.is_some(), bank);
            assert_eq!(m.capital_adequacy_ratio.is_some(), bank);
            if let Some(t1) = m.tier_1_capital {
                assert!(t1 < m.shareholders_equity.unwrap());
            }
        }
    }

    #[test]
    fn market_data_is_daily_and_positive() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        assert_eq!(d.market_data.len(), 30 * SYMBOLS.len());
        for m in &d.market_data {
            assert!(m.close_price > 0.0);
            assert!(m.low_price.unwrap() <= m.high_price.unwrap());
            assert!(!matches!(m.date.weekday(), Weekday::Sat | Weekday::Sun));
        }
        // 5 countries x 5 indicators x 12 quarters.
        assert_eq!(d.economic_indicators.len(), 300);
    }

    #[test]
    fn assessments_come_from_the_engine() {
        let d = SyntheticGenerator::new(small()).unwrap().generate().unwrap();
        assert!(!d.impact_assessments.is_empty());
        let companies: HashMap<Uuid, &Company> = d.companies.iter().map(|c| (c.id, c)).collect();
        let policies: HashMap<Uuid, &Policy> = d.policies.iter().map(|p| (p.id, p)).collect();
        let mut per_policy: HashMap<Uuid, usize> = HashMap::new();
        for a in &d.impact_assessments {
            assert_eq!(a.model_version, radar_impact::ENGINE_MODEL_VERSION);
            let p = policies[&a.policy_id];
            let c = companies[&a.company_id];
            assert!(p.affects_industry(&c.industry));
            assert!(c.has_presence_in(p.jurisdiction.as_str()));
            *per_policy.entry(a.policy_id).or_default() += 1;
        }
        assert!(per_policy.values().all(|&n| n <= 5));
    }

    #[test]
    fn helpers() {
        assert_eq!(category_code("Trade Policy"), "TRA");
        assert_eq!(category_code("Data Privacy"), "DAT");
        assert_eq!(display_industry("financial_services"), "Financial Services");
        let days = trading_days(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 16).unwrap(),
            100,
        );
        assert_eq!(days.len(), 10);
        assert_eq!(annualised_std(&[0.01]), None);
    }
}
