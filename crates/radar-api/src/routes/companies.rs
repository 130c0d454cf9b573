//! # Company Registry API
//!
//! Companies, their qualitative profile and their append-only financial
//! metrics. Any change to an input the impact engine reads re-runs the
//! company's active assessments.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use radar_core::taxonomy::is_known_industry;
use radar_core::{Company, CompanyProfile, FinancialMetrics, JurisdictionCode, RiskTolerance};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::assessments::{self, BatchSummary};
use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the companies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/companies", get(list_companies).post(create_company))
        .route("/api/v1/companies/:id", get(get_company).put(update_company))
        .route(
            "/api/v1/companies/:id/profile",
            get(get_profile).put(put_profile),
        )
        .route(
            "/api/v1/companies/:id/financial-metrics",
            get(list_metrics).post(append_metrics),
        )
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Filters for `GET /api/v1/companies`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Industry slug.
    pub industry: Option<String>,
    /// Headquarters country, case-insensitive.
    pub country: Option<String>,
}

impl Validate for CompanyListQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page).map(|_| ())
    }
}

/// Request to register a company.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub ticker: Option<String>,
    pub isin: Option<String>,
    pub cusip: Option<String>,
    /// Industry slug.
    pub industry: String,
    pub sector: Option<String>,
    pub sub_sector: Option<String>,
    /// Headquarters jurisdiction code.
    pub headquarters_country: String,
    pub headquarters_city: Option<String>,
    pub incorporation_country: Option<String>,
    pub market_cap: Option<f64>,
    pub revenue: Option<f64>,
    pub employees: Option<u32>,
    pub fortune_500_rank: Option<u32>,
    pub business_model: Option<String>,
    #[serde(default)]
    pub primary_markets: Vec<String>,
    #[serde(default)]
    pub supply_chain_exposure: Vec<String>,
    #[serde(default)]
    pub regulatory_jurisdictions: Vec<String>,
    #[serde(default)]
    pub compliance_requirements: Vec<String>,
}

impl Validate for CreateCompanyRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.len() > 300 {
            return Err("name must not exceed 300 characters".to_string());
        }
        check_industry(&self.industry)
    }
}

/// Partial company update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub headquarters_country: Option<String>,
    pub headquarters_city: Option<String>,
    pub market_cap: Option<f64>,
    pub revenue: Option<f64>,
    pub employees: Option<u32>,
    pub business_model: Option<String>,
    pub primary_markets: Option<Vec<String>>,
    pub supply_chain_exposure: Option<Vec<String>>,
    pub regulatory_jurisdictions: Option<Vec<String>>,
    pub compliance_requirements: Option<Vec<String>>,
}

impl Validate for UpdateCompanyRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.industry {
            Some(industry) => check_industry(industry),
            None => Ok(()),
        }
    }
}

/// Full replacement of a company profile.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileRequest {
    pub description: Option<String>,
    pub ceo: Option<String>,
    pub website: Option<String>,
    pub esg_rating: Option<String>,
    pub carbon_footprint: Option<f64>,
    pub risk_tolerance: Option<RiskTolerance>,
    /// Sensitivity to political change, 0..=1.
    pub political_exposure: Option<f64>,
    /// Externally assessed regulatory risk, 0..=1.
    pub regulatory_risk_score: Option<f64>,
}

impl Validate for ProfileRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// One reporting-period snapshot to append.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FinancialMetricsRequest {
    /// Reporting date.
    pub date: Option<NaiveDate>,
    pub total_revenue: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub net_income: Option<f64>,
    pub operating_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub profit_margin: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub tier_1_capital: Option<f64>,
    pub capital_adequacy_ratio: Option<f64>,
    pub effective_tax_rate: Option<f64>,
    pub tax_expense: Option<f64>,
}

impl Validate for FinancialMetricsRequest {
    fn validate(&self) -> Result<(), String> {
        if self.date.is_none() {
            return Err("date is required".to_string());
        }
        Ok(())
    }
}

/// A write to one of the engine's inputs and the resulting recomputation.
#[derive(Debug, Serialize)]
pub struct CompanyWrite<T> {
    pub record: T,
    pub reassessment: BatchSummary,
}

fn check_industry(industry: &str) -> Result<(), String> {
    if is_known_industry(industry) {
        Ok(())
    } else {
        Err(format!("unknown industry '{industry}'"))
    }
}

fn normalize_country(raw: &str) -> Result<String, AppError> {
    Ok(JurisdictionCode::new(raw)?.as_str().to_string())
}

fn normalize_countries(raw: &[String]) -> Result<Vec<String>, AppError> {
    raw.iter().map(|c| normalize_country(c)).collect()
}

fn same_ticker(existing: &Company, candidate: &Company) -> bool {
    matches!(
        (&existing.ticker, &candidate.ticker),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
    )
}

fn ticker_conflict(existing: &Company) -> AppError {
    AppError::Conflict(format!(
        "ticker {} already registered to company {}",
        existing.ticker.as_deref().unwrap_or_default(),
        existing.id
    ))
}

fn find_company(state: &AppState, id: Uuid) -> Result<Company, AppError> {
    state
        .companies
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

/// GET /api/v1/companies — List companies.
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    params(CompanyListQuery),
    responses(
        (status = 200, description = "Page of companies, by name (data)", body = Vec<Company>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn list_companies(
    State(state): State<AppState>,
    query: Result<Query<CompanyListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Company>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let mut companies = state.companies.filter(|c| {
        q.industry
            .as_deref()
            .map_or(true, |i| c.industry.eq_ignore_ascii_case(i))
            && q.country
                .as_deref()
                .map_or(true, |k| c.headquarters_country.eq_ignore_ascii_case(k.trim()))
    });
    companies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(Json(ApiResponse::page(companies, pagination)))
}

/// POST /api/v1/companies — Register a company.
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created (data)", body = Company),
        (status = 409, description = "Ticker already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn create_company(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Company>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let company = Company {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        ticker: req.ticker.map(|t| t.trim().to_ascii_uppercase()),
        isin: req.isin,
        cusip: req.cusip,
        industry: req.industry.to_ascii_lowercase(),
        sector: req.sector,
        sub_sector: req.sub_sector,
        headquarters_country: normalize_country(&req.headquarters_country)?,
        headquarters_city: req.headquarters_city,
        incorporation_country: req
            .incorporation_country
            .as_deref()
            .map(normalize_country)
            .transpose()?,
        market_cap: req.market_cap,
        revenue: req.revenue,
        employees: req.employees,
        fortune_500_rank: req.fortune_500_rank,
        business_model: req.business_model,
        primary_markets: normalize_countries(&req.primary_markets)?,
        supply_chain_exposure: req.supply_chain_exposure,
        regulatory_jurisdictions: normalize_countries(&req.regulatory_jurisdictions)?,
        compliance_requirements: req.compliance_requirements,
        created_at: now,
        updated_at: now,
    };
    company.validate()?;

    state
        .companies
        .insert_unless(company.id, company.clone(), same_ticker)
        .map_err(|existing| ticker_conflict(&existing))?;
    state.persist(&company).await?;
    state.invalidate_caches();

    tracing::info!(company_id = %company.id, industry = %company.industry, "Company created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(company))))
}

/// GET /api/v1/companies/:id — Get a company.
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company found (data)", body = Company),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Company>>, AppError> {
    Ok(Json(ApiResponse::ok(find_company(&state, id)?)))
}

/// PUT /api/v1/companies/:id — Update a company and re-run its assessments.
#[utoipa::path(
    put,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = UpdateCompanyRequest,
    responses(
        (
            status = 200,
            description = "Company updated (data.record), with reassessment",
            body = Company
        ),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ticker already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn update_company(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CompanyWrite<Company>>>, AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let headquarters = req
        .headquarters_country
        .as_deref()
        .map(normalize_country)
        .transpose()?;
    let markets = req
        .primary_markets
        .as_deref()
        .map(normalize_countries)
        .transpose()?;
    let regulators = req
        .regulatory_jurisdictions
        .as_deref()
        .map(normalize_countries)
        .transpose()?;

    let now = Utc::now();
    let company = state
        .companies
        .try_replace_unless(
            &id,
            |company| -> Result<Company, AppError> {
                let mut next = company.clone();
                if let Some(v) = &req.name {
                    next.name = v.trim().to_string();
                }
                if let Some(v) = &req.ticker {
                    next.ticker = Some(v.trim().to_ascii_uppercase());
                }
                if let Some(v) = &req.industry {
                    next.industry = v.to_ascii_lowercase();
                }
                if let Some(v) = &req.sector {
                    next.sector = Some(v.clone());
                }
                if let Some(v) = &headquarters {
                    next.headquarters_country = v.clone();
                }
                if let Some(v) = &req.headquarters_city {
                    next.headquarters_city = Some(v.clone());
                }
                if let Some(v) = req.market_cap {
                    next.market_cap = Some(v);
                }
                if let Some(v) = req.revenue {
                    next.revenue = Some(v);
                }
                if let Some(v) = req.employees {
                    next.employees = Some(v);
                }
                if let Some(v) = &req.business_model {
                    next.business_model = Some(v.clone());
                }
                if let Some(v) = &markets {
                    next.primary_markets = v.clone();
                }
                if let Some(v) = &req.supply_chain_exposure {
                    next.supply_chain_exposure = v.clone();
                }
                if let Some(v) = &regulators {
                    next.regulatory_jurisdictions = v.clone();
                }
                if let Some(v) = &req.compliance_requirements {
                    next.compliance_requirements = v.clone();
                }
                next.updated_at = now;
                next.validate()?;
                Ok(next)
            },
            same_ticker,
            ticker_conflict,
        )
        .ok_or_else(|| AppError::NotFound(format!("company {id} not found")))??;

    state.persist(&company).await?;
    state.invalidate_caches();
    let reassessment = assessments::reassess_company(&state, id, now).await?;

    tracing::info!(company_id = %id, superseded = reassessment.superseded, "Company updated");
    Ok(Json(ApiResponse::ok(CompanyWrite {
        record: company,
        reassessment,
    })))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/v1/companies/:id/profile — Get the company profile.
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}/profile",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Profile found (data)", body = CompanyProfile),
        (
            status = 404,
            description = "Company or profile not found",
            body = crate::error::ErrorBody
        ),
    ),
    tag = "companies"
)]
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CompanyProfile>>, AppError> {
    find_company(&state, id)?;
    state
        .profiles
        .get(&id)
        .map(|p| Json(ApiResponse::ok(p)))
        .ok_or_else(|| AppError::NotFound(format!("company {id} has no profile")))
}

/// PUT /api/v1/companies/:id/profile — Create or replace the profile.
#[utoipa::path(
    put,
    path = "/api/v1/companies/{id}/profile",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = ProfileRequest,
    responses(
        (
            status = 200,
            description = "Profile stored (data.record), with reassessment",
            body = CompanyProfile
        ),
        (status = 404, description = "Company not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn put_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CompanyWrite<CompanyProfile>>>, AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    find_company(&state, id)?;

    let now = Utc::now();
    let existing = state.profiles.get(&id);
    let profile = CompanyProfile {
        id: existing.as_ref().map_or_else(Uuid::new_v4, |p| p.id),
        company_id: id,
        description: req.description,
        ceo: req.ceo,
        website: req.website,
        esg_rating: req.esg_rating,
        carbon_footprint: req.carbon_footprint,
        risk_tolerance: req.risk_tolerance,
        political_exposure: req.political_exposure,
        regulatory_risk_score: req.regulatory_risk_score,
        created_at: existing.as_ref().map_or(now, |p| p.created_at),
        updated_at: now,
    };
    profile.validate()?;

    state.profiles.insert(id, profile.clone());
    state.persist(&profile).await?;
    state.invalidate_caches();
    let reassessment = assessments::reassess_company(&state, id, now).await?;

    tracing::info!(company_id = %id, created = existing.is_none(), "Company profile stored");
    Ok(Json(ApiResponse::ok(CompanyWrite {
        record: profile,
        reassessment,
    })))
}

// ---------------------------------------------------------------------------
// Financial metrics
// ---------------------------------------------------------------------------

/// GET /api/v1/companies/:id/financial-metrics — Metrics, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}/financial-metrics",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (
            status = 200,
            description = "Financial metrics, newest first (data)",
            body = Vec<FinancialMetrics>
        ),
        (status = 404, description = "Company not found", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn list_metrics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<FinancialMetrics>>>, AppError> {
    find_company(&state, id)?;
    let mut rows = state.financials.filter(|m| m.company_id == id);
    rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
    Ok(Json(ApiResponse::ok(rows)))
}

/// POST /api/v1/companies/:id/financial-metrics — Append a snapshot.
#[utoipa::path(
    post,
    path = "/api/v1/companies/{id}/financial-metrics",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = FinancialMetricsRequest,
    responses(
        (
            status = 201,
            description = "Snapshot appended (data.record), with reassessment",
            body = FinancialMetrics
        ),
        (status = 404, description = "Company not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "companies"
)]
async fn append_metrics(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<FinancialMetricsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CompanyWrite<FinancialMetrics>>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;
    find_company(&state, id)?;

    let now = Utc::now();
    let metrics = FinancialMetrics {
        id: Uuid::new_v4(),
        company_id: id,
        date: req.date.unwrap_or_else(|| now.date_naive()),
        total_revenue: req.total_revenue,
        revenue_growth: req.revenue_growth,
        net_income: req.net_income,
        operating_income: req.operating_income,
        ebitda: req.ebitda,
        profit_margin: req.profit_margin,
        total_assets: req.total_assets,
        total_liabilities: req.total_liabilities,
        shareholders_equity: req.shareholders_equity,
        debt_to_equity: req.debt_to_equity,
        operating_cash_flow: req.operating_cash_flow,
        free_cash_flow: req.free_cash_flow,
        market_cap: req.market_cap,
        enterprise_value: req.enterprise_value,
        pe_ratio: req.pe_ratio,
        pb_ratio: req.pb_ratio,
        tier_1_capital: req.tier_1_capital,
        capital_adequacy_ratio: req.capital_adequacy_ratio,
        effective_tax_rate: req.effective_tax_rate,
        tax_expense: req.tax_expense,
        created_at: now,
    };
    metrics.validate()?;

    state.financials.insert(metrics.id, metrics.clone());
    state.persist(&metrics).await?;
    state.invalidate_caches();
    let reassessment = assessments::reassess_company(&state, id, now).await?;

    tracing::info!(company_id = %id, date = %metrics.date, "Financial metrics appended");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CompanyWrite {
            record: metrics,
            reassessment,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countries_are_normalised() {
        assert_eq!(normalize_country(" us ").unwrap(), "US");
        assert_eq!(
            normalize_countries(&["de".into(), "eu".into()]).unwrap(),
            vec!["DE".to_string(), "EU".to_string()]
        );
        assert!(matches!(
            normalize_country("!"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn metrics_request_requires_date() {
        assert!(FinancialMetricsRequest::default().validate().is_err());
        let req = FinancialMetricsRequest {
            date: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..FinancialMetricsRequest::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn industry_must_be_known() {
        assert!(check_industry("technology").is_ok());
        assert!(check_industry("alchemy").is_err());
    }
}
