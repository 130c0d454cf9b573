//! # Market Data API
//!
//! Append-only price bars, macroeconomic observations and customs trade
//! flows. A second row for the same instrument and date, or a reused
//! `trade_id`, is rejected with 409.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use radar_core::{EconomicIndicator, Frequency, MarketData, TradeFlow, TradeType};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{require_role, CallerIdentity, Role};
use crate::envelope::{ApiResponse, Pagination};
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, Validate};
use crate::state::AppState;

/// Build the market data router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/market-data", get(list_market_data).post(append_market_data))
        .route(
            "/api/v1/market-data/economic-indicators",
            get(list_indicators).post(append_indicator),
        )
        .route(
            "/api/v1/market-data/trade-flows",
            get(list_trade_flows).post(append_trade_flow),
        )
}

// ── Types ───────────────────────────────────────────────────────────

/// Filters for `GET /api/v1/market-data`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MarketDataQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Instrument symbol, case-insensitive.
    pub symbol: Option<String>,
    /// Earliest trading date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Latest trading date (inclusive).
    pub end_date: Option<NaiveDate>,
}

impl Validate for MarketDataQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err("end_date must not precede start_date".to_string());
            }
        }
        Ok(())
    }
}

/// Filters for `GET /api/v1/market-data/economic-indicators`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IndicatorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Country or bloc code, case-insensitive.
    pub country: Option<String>,
    /// Series code, case-insensitive.
    pub indicator_code: Option<String>,
}

impl Validate for IndicatorQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page).map(|_| ())
    }
}

/// One price bar to append.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarketDataRequest {
    pub symbol: String,
    pub asset_type: String,
    pub exchange: Option<String>,
    pub date: NaiveDate,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: f64,
    pub adjusted_close: Option<f64>,
    pub volume: Option<u64>,
    pub daily_return: Option<f64>,
    pub volatility: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub data_source: Option<String>,
}

impl Validate for MarketDataRequest {
    fn validate(&self) -> Result<(), String> {
        if self.symbol.len() > 20 {
            return Err("symbol must not exceed 20 characters".to_string());
        }
        Ok(())
    }
}

/// One indicator observation to append.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IndicatorRequest {
    pub indicator_name: String,
    pub indicator_code: String,
    pub category: Option<String>,
    pub country: String,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub value: f64,
    pub previous_value: Option<f64>,
    pub unit: Option<String>,
    pub source_agency: Option<String>,
}

impl Validate for IndicatorRequest {
    fn validate(&self) -> Result<(), String> {
        if self.indicator_code.len() > 50 {
            return Err("indicator_code must not exceed 50 characters".to_string());
        }
        Ok(())
    }
}

/// Filters for `GET /api/v1/market-data/trade-flows`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TradeFlowQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Origin country, case-insensitive.
    pub origin_country: Option<String>,
    /// Destination country, case-insensitive.
    pub destination_country: Option<String>,
    /// Product family, case-insensitive.
    pub product_category: Option<String>,
    /// Earliest declaration date (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Latest declaration date (inclusive).
    pub end_date: Option<NaiveDate>,
}

impl Validate for TradeFlowQuery {
    fn validate(&self) -> Result<(), String> {
        Pagination::new(self.page, self.per_page)?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err("end_date must not precede start_date".to_string());
            }
        }
        Ok(())
    }
}

/// One customs entry to append.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TradeFlowRequest {
    pub trade_id: String,
    pub trade_type: TradeType,
    pub origin_country: String,
    pub destination_country: String,
    #[serde(default)]
    pub transit_countries: Vec<String>,
    pub product_category: String,
    pub product_code: Option<String>,
    pub product_description: Option<String>,
    pub date: NaiveDate,
    pub quantity: Option<f64>,
    pub quantity_unit: Option<String>,
    pub value_usd: f64,
    pub value_local: Option<f64>,
    pub local_currency: Option<String>,
    pub tariff_rate: Option<f64>,
    pub duty_amount: Option<f64>,
    #[serde(default)]
    pub preferential_treatment: bool,
    pub transport_mode: Option<String>,
    pub shipping_route: Option<String>,
    pub transit_time_days: Option<u32>,
    pub exporter_company: Option<String>,
    pub importer_company: Option<String>,
    #[serde(default)]
    pub affected_by_policies: Vec<Uuid>,
    pub policy_impact_amount: Option<f64>,
    pub data_source: Option<String>,
}

impl Validate for TradeFlowRequest {
    fn validate(&self) -> Result<(), String> {
        if self.trade_id.len() > 100 {
            return Err("trade_id must not exceed 100 characters".to_string());
        }
        if self.origin_country.trim().eq_ignore_ascii_case(self.destination_country.trim()) {
            return Err("destination_country must differ from origin_country".to_string());
        }
        Ok(())
    }
}

// ── Market data ─────────────────────────────────────────────────────

/// GET /api/v1/market-data — Price bars, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/market-data",
    params(MarketDataQuery),
    responses(
        (status = 200, description = "Page of price bars (data)", body = Vec<MarketData>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "market"
)]
async fn list_market_data(
    State(state): State<AppState>,
    query: Result<Query<MarketDataQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<MarketData>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let mut rows = state.market_data.filter(|m| {
        q.symbol
            .as_deref()
            .map_or(true, |s| m.symbol.eq_ignore_ascii_case(s.trim()))
            && q.start_date.map_or(true, |d| m.date >= d)
            && q.end_date.map_or(true, |d| m.date <= d)
    });
    rows.sort_by(|a, b| a.key().cmp(&b.key()));
    Ok(Json(ApiResponse::page(rows, pagination)))
}

/// POST /api/v1/market-data — Append a price bar.
#[utoipa::path(
    post,
    path = "/api/v1/market-data",
    request_body = MarketDataRequest,
    responses(
        (status = 201, description = "Bar appended (data)", body = MarketData),
        (
            status = 409,
            description = "Bar for symbol and date exists",
            body = crate::error::ErrorBody
        ),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "market"
)]
async fn append_market_data(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<MarketDataRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MarketData>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let bar = MarketData {
        id: Uuid::new_v4(),
        symbol: req.symbol.trim().to_ascii_uppercase(),
        asset_type: req.asset_type,
        exchange: req.exchange,
        date: req.date,
        open_price: req.open_price,
        high_price: req.high_price,
        low_price: req.low_price,
        close_price: req.close_price,
        adjusted_close: req.adjusted_close,
        volume: req.volume,
        daily_return: req.daily_return,
        volatility: req.volatility,
        market_cap: req.market_cap,
        pe_ratio: req.pe_ratio,
        dividend_yield: req.dividend_yield,
        data_source: req.data_source,
        created_at: Utc::now(),
    };
    bar.validate()?;

    state
        .market_data
        .insert_unless(bar.id, bar.clone(), |m, new| m.key() == new.key())
        .map_err(|existing| {
            let key = existing.key();
            AppError::Conflict(format!(
                "market data for {} on {} already exists",
                key.0, key.1
            ))
        })?;
    state.persist(&bar).await?;
    state.invalidate_caches();

    tracing::debug!(symbol = %bar.symbol, date = %bar.date, "Market data appended");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(bar))))
}

// ── Economic indicators ─────────────────────────────────────────────

/// GET /api/v1/market-data/economic-indicators — Observations, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/market-data/economic-indicators",
    params(IndicatorQuery),
    responses(
        (status = 200, description = "Page of observations (data)", body = Vec<EconomicIndicator>),
    ),
    tag = "market"
)]
async fn list_indicators(
    State(state): State<AppState>,
    query: Result<Query<IndicatorQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<EconomicIndicator>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let mut rows = state.indicators.filter(|i| {
        q.country
            .as_deref()
            .map_or(true, |c| i.country.eq_ignore_ascii_case(c.trim()))
            && q
                .indicator_code
                .as_deref()
                .map_or(true, |c| i.indicator_code.eq_ignore_ascii_case(c.trim()))
    });
    rows.sort_by(|a, b| a.key().cmp(&b.key()));
    Ok(Json(ApiResponse::page(rows, pagination)))
}

/// POST /api/v1/market-data/economic-indicators — Append an observation.
#[utoipa::path(
    post,
    path = "/api/v1/market-data/economic-indicators",
    request_body = IndicatorRequest,
    responses(
        (status = 201, description = "Observation appended (data)", body = EconomicIndicator),
        (
            status = 409,
            description = "Observation for code, country and date exists",
            body = crate::error::ErrorBody
        ),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "market"
)]
async fn append_indicator(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<IndicatorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<EconomicIndicator>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let indicator = EconomicIndicator {
        id: Uuid::new_v4(),
        indicator_name: req.indicator_name,
        indicator_code: req.indicator_code.trim().to_ascii_uppercase(),
        category: req.category,
        country: req.country.trim().to_ascii_uppercase(),
        date: req.date,
        frequency: req.frequency,
        value: req.value,
        previous_value: req.previous_value,
        change: req.previous_value.map(|p| req.value - p),
        unit: req.unit,
        source_agency: req.source_agency,
        created_at: Utc::now(),
    };
    indicator.validate()?;

    state
        .indicators
        .insert_unless(indicator.id, indicator.clone(), |i, new| i.key() == new.key())
        .map_err(|existing| {
            let key = existing.key();
            AppError::Conflict(format!(
                "{} for {} on {} already exists",
                key.0, key.1, key.2
            ))
        })?;
    state.persist(&indicator).await?;
    state.invalidate_caches();

    tracing::debug!(
        indicator_code = %indicator.indicator_code,
        country = %indicator.country,
        "Economic indicator appended"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(indicator))))
}

// ── Trade flows ─────────────────────────────────────────────────────

/// GET /api/v1/market-data/trade-flows — Customs entries, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/market-data/trade-flows",
    params(TradeFlowQuery),
    responses(
        (status = 200, description = "Page of trade flows (data)", body = Vec<TradeFlow>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "market"
)]
async fn list_trade_flows(
    State(state): State<AppState>,
    query: Result<Query<TradeFlowQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TradeFlow>>>, AppError> {
    let q = extract_query(query)?;
    let pagination = Pagination::new(q.page, q.per_page).map_err(AppError::Validation)?;
    let matches = |field: &str, wanted: Option<&str>| {
        wanted.map_or(true, |w| field.eq_ignore_ascii_case(w.trim()))
    };
    let mut rows = state.trade_flows.filter(|f| {
        matches(&f.origin_country, q.origin_country.as_deref())
            && matches(&f.destination_country, q.destination_country.as_deref())
            && matches(&f.product_category, q.product_category.as_deref())
            && q.start_date.map_or(true, |d| f.date >= d)
            && q.end_date.map_or(true, |d| f.date <= d)
    });
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.key().cmp(&b.key())));
    Ok(Json(ApiResponse::page(rows, pagination)))
}

/// POST /api/v1/market-data/trade-flows — Append a customs entry.
#[utoipa::path(
    post,
    path = "/api/v1/market-data/trade-flows",
    request_body = TradeFlowRequest,
    responses(
        (status = 201, description = "Trade flow appended (data)", body = TradeFlow),
        (status = 409, description = "Trade ID already recorded", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "market"
)]
async fn append_trade_flow(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<TradeFlowRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TradeFlow>>), AppError> {
    require_role(&caller, Role::Analyst)?;
    let req = extract_validated_json(body)?;

    let flow = TradeFlow {
        id: Uuid::new_v4(),
        trade_id: req.trade_id.trim().to_string(),
        trade_type: req.trade_type,
        origin_country: req.origin_country.trim().to_ascii_uppercase(),
        destination_country: req.destination_country.trim().to_ascii_uppercase(),
        transit_countries: req
            .transit_countries
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .collect(),
        product_category: req.product_category.trim().to_ascii_lowercase(),
        product_code: req.product_code,
        product_description: req.product_description,
        date: req.date,
        quantity: req.quantity,
        quantity_unit: req.quantity_unit,
        value_usd: req.value_usd,
        value_local: req.value_local,
        local_currency: req.local_currency,
        tariff_rate: req.tariff_rate,
        duty_amount: req.duty_amount,
        preferential_treatment: req.preferential_treatment,
        transport_mode: req.transport_mode,
        shipping_route: req.shipping_route,
        transit_time_days: req.transit_time_days,
        exporter_company: req.exporter_company,
        importer_company: req.importer_company,
        affected_by_policies: req.affected_by_policies,
        policy_impact_amount: req.policy_impact_amount,
        data_source: req.data_source,
        created_at: Utc::now(),
    };
    flow.validate()?;

    state
        .trade_flows
        .insert_unless(flow.id, flow.clone(), |f, new| f.key() == new.key())
        .map_err(|existing| {
            AppError::Conflict(format!("trade flow {} already exists", existing.trade_id))
        })?;
    state.persist(&flow).await?;
    state.invalidate_caches();

    tracing::debug!(
        trade_id = %flow.trade_id,
        origin = %flow.origin_country,
        destination = %flow.destination_country,
        "Trade flow appended"
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(flow))))
}
