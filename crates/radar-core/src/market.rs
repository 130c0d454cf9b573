//! Market prices, macroeconomic indicators and customs trade flows.
//!
//! All three series are append-only. A second row for the same instrument
//! and date (or the same trade reference) is a conflict, not an update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Daily price bar for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MarketData {
    /// Record ID.
    pub id: Uuid,
    /// Ticker or instrument symbol.
    pub symbol: String,
    /// `stock`, `bond`, `commodity`, ...
    pub asset_type: String,
    /// Listing exchange.
    pub exchange: Option<String>,
    /// Trading date.
    pub date: NaiveDate,
    /// Open.
    pub open_price: Option<f64>,
    /// High.
    pub high_price: Option<f64>,
    /// Low.
    pub low_price: Option<f64>,
    /// Close.
    pub close_price: f64,
    /// Close adjusted for splits and dividends.
    pub adjusted_close: Option<f64>,
    /// Shares traded.
    pub volume: Option<u64>,
    /// Close-to-close return.
    pub daily_return: Option<f64>,
    /// Rolling volatility.
    pub volatility: Option<f64>,
    /// Market capitalisation.
    pub market_cap: Option<f64>,
    /// Price / earnings.
    pub pe_ratio: Option<f64>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Feed the bar came from.
    pub data_source: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl MarketData {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_empty("symbol", &self.symbol)?;
        ValidationError::check_non_empty("asset_type", &self.asset_type)?;
        ValidationError::check_range("close_price", self.close_price, 0.0, f64::MAX)?;
        if let (Some(low), Some(high)) = (self.low_price, self.high_price) {
            if low > high {
                return Err(ValidationError::OutOfRange {
                    field: "low_price",
                    value: low,
                    min: 0.0,
                    max: high,
                });
            }
        }
        Ok(())
    }

    /// Uniqueness key.
    pub fn key(&self) -> (String, NaiveDate) {
        (self.symbol.to_ascii_uppercase(), self.date)
    }
}

/// How often an indicator is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Daily.
    Daily,
    /// Weekly.
    Weekly,
    /// Monthly.
    Monthly,
    /// Quarterly.
    Quarterly,
    /// Annual.
    Annual,
}

/// One observation of a macroeconomic series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EconomicIndicator {
    /// Record ID.
    pub id: Uuid,
    /// Display name.
    pub indicator_name: String,
    /// Series code (`GDP_GROWTH`, `CPI`, ...).
    pub indicator_code: String,
    /// Grouping (`growth`, `prices`, ...).
    pub category: Option<String>,
    /// Country or bloc code.
    pub country: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Publication frequency.
    pub frequency: Frequency,
    /// Observed value.
    pub value: f64,
    /// Prior observation.
    pub previous_value: Option<f64>,
    /// `value - previous_value`.
    pub change: Option<f64>,
    /// Unit (`percent`, `index`, ...).
    pub unit: Option<String>,
    /// Publishing agency.
    pub source_agency: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl EconomicIndicator {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_empty("indicator_name", &self.indicator_name)?;
        ValidationError::check_non_empty("indicator_code", &self.indicator_code)?;
        ValidationError::check_non_empty("country", &self.country)?;
        if !self.value.is_finite() {
            return Err(ValidationError::NotFinite("value"));
        }
        Ok(())
    }

    /// Uniqueness key.
    pub fn key(&self) -> (String, String, NaiveDate) {
        (
            self.indicator_code.to_ascii_uppercase(),
            self.country.to_ascii_uppercase(),
            self.date,
        )
    }
}

/// Direction of a customs entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// Goods entering the destination.
    Import,
    /// Goods leaving the origin.
    Export,
    /// Goods passed through without transformation.
    ReExport,
}

impl TradeType {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
            Self::ReExport => "re_export",
        }
    }
}

/// One cross-border shipment as reported by customs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TradeFlow {
    /// Record ID.
    pub id: Uuid,
    /// Customs reference, unique per flow.
    pub trade_id: String,
    /// Direction.
    pub trade_type: TradeType,
    /// Shipping country.
    pub origin_country: String,
    /// Receiving country.
    pub destination_country: String,
    /// Countries crossed in between.
    #[serde(default)]
    pub transit_countries: Vec<String>,
    /// Product family (`electronics`, `agriculture`, ...).
    pub product_category: String,
    /// HS or similar tariff code.
    pub product_code: Option<String>,
    /// Free-text description.
    pub product_description: Option<String>,
    /// Declaration date.
    pub date: NaiveDate,
    /// Quantity shipped.
    pub quantity: Option<f64>,
    /// Unit of `quantity`.
    pub quantity_unit: Option<String>,
    /// Declared value in USD.
    pub value_usd: f64,
    /// Declared value in the local currency.
    pub value_local: Option<f64>,
    /// ISO code of the local currency.
    pub local_currency: Option<String>,
    /// Applied tariff as a fraction of value.
    pub tariff_rate: Option<f64>,
    /// Duty collected.
    pub duty_amount: Option<f64>,
    /// Whether a trade agreement rate applied.
    #[serde(default)]
    pub preferential_treatment: bool,
    /// `sea`, `air`, `land` or `rail`.
    pub transport_mode: Option<String>,
    /// Named route, if any.
    pub shipping_route: Option<String>,
    /// Days in transit.
    pub transit_time_days: Option<u32>,
    /// Exporting company name.
    pub exporter_company: Option<String>,
    /// Importing company name.
    pub importer_company: Option<String>,
    /// Policies the shipment fell under.
    #[serde(default)]
    pub affected_by_policies: Vec<Uuid>,
    /// Cost or saving attributed to those policies.
    pub policy_impact_amount: Option<f64>,
    /// Reporting authority.
    pub data_source: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TradeFlow {
    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::check_non_empty("trade_id", &self.trade_id)?;
        ValidationError::check_non_empty("origin_country", &self.origin_country)?;
        ValidationError::check_non_empty("destination_country", &self.destination_country)?;
        ValidationError::check_non_empty("product_category", &self.product_category)?;
        ValidationError::check_range("value_usd", self.value_usd, 0.0, f64::MAX)?;
        ValidationError::check_optional_range("quantity", self.quantity, 0.0, f64::MAX)?;
        ValidationError::check_optional_range("tariff_rate", self.tariff_rate, 0.0, 1.0)?;
        ValidationError::check_optional_range("duty_amount", self.duty_amount, 0.0, f64::MAX)?;
        Ok(())
    }

    /// Uniqueness key.
    pub fn key(&self) -> String {
        self.trade_id.to_ascii_uppercase()
    }

    /// Whether the flow touches `country` as origin, destination or transit.
    pub fn involves(&self, country: &str) -> bool {
        self.origin_country.eq_ignore_ascii_case(country)
            || self.destination_country.eq_ignore_ascii_case(country)
            || self
                .transit_countries
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64) -> MarketData {
        MarketData {
            id: Uuid::new_v4(),
            symbol: "aapl".to_string(),
            asset_type: "stock".to_string(),
            exchange: Some("NASDAQ".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            open_price: Some(close),
            high_price: Some(close + 1.0),
            low_price: Some(close - 1.0),
            close_price: close,
            adjusted_close: None,
            volume: Some(1_000),
            daily_return: None,
            volatility: None,
            market_cap: None,
            pe_ratio: None,
            dividend_yield: None,
            data_source: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn market_key_normalises_symbol() {
        let b = bar(100.0);
        assert_eq!(b.key().0, "AAPL");
        assert!(b.validate().is_ok());
    }

    #[test]
    fn negative_close_rejected() {
        assert!(bar(-1.0).validate().is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        let mut b = bar(100.0);
        b.low_price = Some(120.0);
        assert!(b.validate().is_err());
    }

    fn flow() -> TradeFlow {
        TradeFlow {
            id: Uuid::new_v4(),
            trade_id: "trade_000001".to_string(),
            trade_type: TradeType::ReExport,
            origin_country: "CN".to_string(),
            destination_country: "US".to_string(),
            transit_countries: vec!["SG".to_string()],
            product_category: "electronics".to_string(),
            product_code: Some("8471".to_string()),
            product_description: None,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            quantity: Some(500.0),
            quantity_unit: Some("units".to_string()),
            value_usd: 250_000.0,
            value_local: None,
            local_currency: None,
            tariff_rate: Some(0.25),
            duty_amount: Some(62_500.0),
            preferential_treatment: false,
            transport_mode: Some("sea".to_string()),
            shipping_route: None,
            transit_time_days: Some(21),
            exporter_company: None,
            importer_company: None,
            affected_by_policies: Vec::new(),
            policy_impact_amount: None,
            data_source: Some("Customs Authority".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn trade_flow_checks_value_and_tariff() {
        let f = flow();
        assert!(f.validate().is_ok());
        assert_eq!(f.key(), "TRADE_000001");

        let mut tariff = flow();
        tariff.tariff_rate = Some(1.5);
        assert!(matches!(
            tariff.validate(),
            Err(ValidationError::OutOfRange { field: "tariff_rate", .. })
        ));

        let mut value = flow();
        value.value_usd = -10.0;
        assert!(value.validate().is_err());

        let mut blank = flow();
        blank.origin_country = " ".to_string();
        assert_eq!(blank.validate(), Err(ValidationError::EmptyField("origin_country")));
    }

    #[test]
    fn trade_flow_involves_transit_countries() {
        let f = flow();
        assert!(f.involves("cn"));
        assert!(f.involves("SG"));
        assert!(!f.involves("DE"));
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["trade_type"], "re_export");
    }

    #[test]
    fn frequency_serde() {
        assert_eq!(serde_json::to_string(&Frequency::Quarterly).unwrap(), "\"quarterly\"");
    }
}
