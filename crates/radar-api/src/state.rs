//! # Application State
//!
//! Shared state for the Axum application, passed to handlers via the
//! `State` extractor.
//!
//! ## Architecture
//!
//! - **Registries**: policies, categories, change history, companies,
//!   profiles, financials, market data and indicators, each a [`Store`].
//! - **Assessment ledger**: the single source of truth for which impact
//!   assessment is active per (policy, company, period).
//! - **Prediction book**: issued predictions, supersession heads and
//!   recorded outcomes.
//! - **Engines**: the impact engine and the forecaster are stateless and
//!   shared.
//!
//! Locks are `parking_lot` and are never held across `.await`; handlers
//! compute under a lock, clone what must be persisted, release, then write
//! through to PostgreSQL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use radar_core::{
    CategoryGroup, Company, CompanyProfile, EconomicIndicator, FinancialMetrics, MarketData,
    Policy, PolicyCategory, PolicyChange, Settings, TradeFlow,
};
use radar_forecast::{Forecaster, PredictionBook};
use radar_impact::{AssessmentLedger, ImpactEngine};
use radar_synth::Dataset;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::db::documents::{self, Document};
use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;

// ── Generic In-Memory Store ─────────────────────────────────────────

/// Thread-safe, cloneable in-memory key-value store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value for the key.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Every record, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching `pred`.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| pred(v)).cloned().collect()
    }

    /// Whether any record matches `pred`.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.data.read().values().any(pred)
    }

    /// Atomically read-validate-update a record. `None` if absent.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Insert `value` unless an existing record clashes with it. The check
    /// and the insert share one write lock. On a clash the existing record
    /// is returned and nothing is written.
    pub fn insert_unless(
        &self,
        id: Uuid,
        value: T,
        clashes: impl Fn(&T, &T) -> bool,
    ) -> Result<(), T> {
        let mut data = self.data.write();
        if let Some(existing) = data.values().find(|v| clashes(*v, &value)) {
            return Err(existing.clone());
        }
        data.insert(id, value);
        Ok(())
    }

    /// Replace a record with `f(current)` unless the replacement clashes
    /// with another record, all under one write lock. `None` if absent.
    pub fn try_replace_unless<E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&T) -> Result<T, E>,
        clashes: impl Fn(&T, &T) -> bool,
        conflict: impl FnOnce(&T) -> E,
    ) -> Option<Result<T, E>> {
        let mut data = self.data.write();
        let next = match f(data.get(id)?) {
            Ok(next) => next,
            Err(e) => return Some(Err(e)),
        };
        if let Some((_, other)) = data.iter().find(|(k, v)| **k != *id && clashes(*v, &next)) {
            return Some(Err(conflict(other)));
        }
        data.insert(*id, next.clone());
        Some(Ok(next))
    }

    /// Whether the key exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Reports ─────────────────────────────────────────────────────────

/// A generated report bundle. Reports are held in memory only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportRecord {
    /// `REP_YYYYmmdd_HHMMSS`, with a numeric suffix on collision.
    pub report_id: String,
    /// `impact_summary`, `risk_analysis`, `policy_overview` or `prediction_accuracy`.
    pub report_type: String,
    /// Output format. Only `json` is produced.
    pub format: String,
    /// Filters the report was built with.
    #[schema(value_type = Object)]
    pub parameters: serde_json::Value,
    /// Report body.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

// ── Configuration ───────────────────────────────────────────────────

/// API configuration derived from [`Settings`].
#[derive(Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    /// Static bearer token. `None` disables auth.
    pub auth_token: Option<String>,
    pub rate_limit_per_minute: u32,
    pub cache_ttl: Duration,
    pub metrics_enabled: bool,
    pub max_workers: usize,
    pub prediction_horizon_months: u32,
    pub confidence_threshold: f64,
    pub impact_accuracy_target: f64,
}

impl From<&Settings> for AppConfig {
    fn from(s: &Settings) -> Self {
        Self {
            app_name: s.app_name.clone(),
            app_version: s.app_version.clone(),
            auth_token: s.auth_token.clone(),
            rate_limit_per_minute: s.rate_limit_per_minute,
            cache_ttl: Duration::from_secs(s.cache_ttl_seconds),
            metrics_enabled: s.metrics_enabled,
            max_workers: s.max_workers,
            prediction_horizon_months: s.prediction_horizon_months,
            confidence_threshold: s.confidence_threshold,
            impact_accuracy_target: s.impact_accuracy_target,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("cache_ttl", &self.cache_ttl)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

// ── AppState ────────────────────────────────────────────────────────

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub policies: Store<Policy>,
    pub categories: Store<PolicyCategory>,
    pub policy_changes: Store<PolicyChange>,
    pub companies: Store<Company>,
    /// Keyed by company ID; at most one profile per company.
    pub profiles: Store<CompanyProfile>,
    pub financials: Store<FinancialMetrics>,
    pub market_data: Store<MarketData>,
    pub indicators: Store<EconomicIndicator>,
    pub trade_flows: Store<TradeFlow>,

    pub ledger: Arc<RwLock<AssessmentLedger>>,
    pub predictions: Arc<RwLock<PredictionBook>>,
    pub reports: Arc<RwLock<BTreeMap<String, ReportRecord>>>,

    pub engine: ImpactEngine,
    pub forecaster: Arc<Forecaster>,

    pub cache: ResponseCache,
    pub metrics: ApiMetrics,

    /// When `None`, the API runs in in-memory mode.
    pub db_pool: Option<PgPool>,
    pub config: AppConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("policies", &self.policies.len())
            .field("companies", &self.companies.len())
            .field("assessments", &self.ledger.read().len())
            .field("predictions", &self.predictions.read().len())
            .field("db", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with explicit configuration and optional database.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            policies: Store::new(),
            categories: Store::new(),
            policy_changes: Store::new(),
            companies: Store::new(),
            profiles: Store::new(),
            financials: Store::new(),
            market_data: Store::new(),
            indicators: Store::new(),
            trade_flows: Store::new(),
            ledger: Arc::new(RwLock::new(AssessmentLedger::new())),
            predictions: Arc::new(RwLock::new(PredictionBook::new())),
            reports: Arc::new(RwLock::new(BTreeMap::new())),
            engine: ImpactEngine::new(config.max_workers),
            forecaster: Arc::new(Forecaster::default()),
            cache: ResponseCache::new(config.cache_ttl),
            metrics: ApiMetrics::new(),
            db_pool,
            config,
        }
    }

    /// Whether no policies and no companies are loaded.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.companies.is_empty()
    }

    /// Category group of a policy. Uncategorised policies are `General`.
    pub fn group_of(&self, policy: &Policy) -> CategoryGroup {
        policy
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map_or(CategoryGroup::General, |c| c.group)
    }

    /// Most recent financial metrics for a company.
    pub fn latest_metrics(&self, company_id: Uuid) -> Option<FinancialMetrics> {
        let rows = self.financials.filter(|m| m.company_id == company_id);
        FinancialMetrics::latest(&rows).cloned()
    }

    /// Write `record` through to the database, if one is configured.
    pub async fn persist<T: Document>(&self, record: &T) -> Result<(), AppError> {
        match &self.db_pool {
            Some(pool) => documents::save(pool, record)
                .await
                .map_err(|e| AppError::persistence(T::COLLECTION.table(), e)),
            None => Ok(()),
        }
    }

    /// Write every record through. Stops at the first failure.
    pub async fn persist_all<T: Document>(&self, records: &[T]) -> Result<(), AppError> {
        for record in records {
            self.persist(record).await?;
        }
        Ok(())
    }

    /// Drop cached analytics after a write.
    pub fn invalidate_caches(&self) {
        self.cache.invalidate_all();
    }

    /// Replace the in-memory contents with a dataset.
    pub fn load_dataset(&self, dataset: Dataset) {
        for c in dataset.policy_categories {
            self.categories.insert(c.id, c);
        }
        for p in dataset.policies {
            self.policies.insert(p.id, p);
        }
        for c in dataset.policy_changes {
            self.policy_changes.insert(c.id, c);
        }
        for c in dataset.companies {
            self.companies.insert(c.id, c);
        }
        for p in dataset.company_profiles {
            self.profiles.insert(p.company_id, p);
        }
        for m in dataset.financial_metrics {
            self.financials.insert(m.id, m);
        }
        for m in dataset.market_data {
            self.market_data.insert(m.id, m);
        }
        for i in dataset.economic_indicators {
            self.indicators.insert(i.id, i);
        }
        for t in dataset.trade_flows {
            self.trade_flows.insert(t.id, t);
        }
        let (ledger, _) = AssessmentLedger::restore(dataset.impact_assessments);
        *self.ledger.write() = ledger;
        self.invalidate_caches();
    }

    /// Load every persisted collection into memory and rebuild the ledger
    /// and prediction book. Assessments demoted during the rebuild are
    /// written back.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        async fn load<T: Document>(pool: &PgPool) -> Result<Vec<T>, String> {
            documents::load_all::<T>(pool)
                .await
                .map_err(|e| format!("failed to load {}: {e}", T::COLLECTION.table()))
        }

        let categories: Vec<PolicyCategory> = load(pool).await?;
        let policies: Vec<Policy> = load(pool).await?;
        let changes: Vec<PolicyChange> = load(pool).await?;
        let companies: Vec<Company> = load(pool).await?;
        let profiles: Vec<CompanyProfile> = load(pool).await?;
        let financials: Vec<FinancialMetrics> = load(pool).await?;
        let market: Vec<MarketData> = load(pool).await?;
        let indicators: Vec<EconomicIndicator> = load(pool).await?;
        let trade_flows: Vec<TradeFlow> = load(pool).await?;
        let assessments = load(pool).await?;
        let predictions = load(pool).await?;
        let outcomes = load(pool).await?;

        let counts = (policies.len(), companies.len(), market.len());
        self.load_dataset(Dataset {
            policy_categories: categories,
            policies,
            policy_changes: changes,
            companies,
            company_profiles: profiles,
            financial_metrics: financials,
            market_data: market,
            economic_indicators: indicators,
            trade_flows,
            impact_assessments: Vec::new(),
        });

        let (ledger, repaired) = AssessmentLedger::restore(assessments);
        let demoted: Vec<_> = repaired
            .iter()
            .filter_map(|id| ledger.get(id).cloned())
            .collect();
        let assessment_count = ledger.len();
        *self.ledger.write() = ledger;

        let book = PredictionBook::restore(predictions, outcomes);
        let prediction_count = book.len();
        *self.predictions.write() = book;

        for record in &demoted {
            documents::save(pool, record)
                .await
                .map_err(|e| {
                    format!("failed to write back demoted assessment {}: {e}", record.id)
                })?;
        }

        tracing::info!(
            policies = counts.0,
            companies = counts.1,
            market_rows = counts.2,
            assessments = assessment_count,
            predictions = prediction_count,
            demoted = demoted.len(),
            "Hydrated in-memory stores from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_crud() {
        let store: Store<String> = Store::new();
        let id = Uuid::new_v4();
        assert!(store.insert(id, "a".into()).is_none());
        assert_eq!(store.get(&id).as_deref(), Some("a"));
        assert!(store.contains(&id));
        let updated = store.try_update(&id, |v| {
            v.push('b');
            Ok::<_, ()>(v.clone())
        });
        assert_eq!(updated, Some(Ok("ab".to_string())));
        assert!(store.try_update(&Uuid::new_v4(), |_| Ok::<_, ()>(())).is_none());
        assert_eq!(store.filter(|v| v.starts_with('a')).len(), 1);
        assert!(store.any(|v| v == "ab"));
    }

    #[test]
    fn unique_insert_and_replace() {
        let store: Store<String> = Store::new();
        let same = |a: &String, b: &String| a.eq_ignore_ascii_case(b);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(store.insert_unless(a, "AAA".into(), same).is_ok());
        assert!(store.insert_unless(b, "BBB".into(), same).is_ok());
        let dup = store.insert_unless(Uuid::new_v4(), "aaa".into(), same);
        assert_eq!(dup, Err("AAA".to_string()));
        assert_eq!(store.len(), 2);

        let conflict = |o: &String| o.clone();
        let clash = store.try_replace_unless(&b, |_| Ok("AAA".into()), same, conflict);
        assert_eq!(clash, Some(Err("AAA".to_string())));
        assert_eq!(store.get(&b).as_deref(), Some("BBB"));

        // Replacing a record with its own key never clashes with itself.
        let own = store.try_replace_unless(&a, |v| Ok(v.to_lowercase()), same, conflict);
        assert_eq!(own, Some(Ok("aaa".to_string())));
        let missing = store.try_replace_unless(&Uuid::new_v4(), |v| Ok(v.clone()), same, conflict);
        assert!(missing.is_none());
    }

    #[test]
    fn store_clones_share_data() {
        let a: Store<u32> = Store::new();
        let b = a.clone();
        a.insert(Uuid::new_v4(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("hunter2".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn config_follows_settings() {
        let settings = Settings {
            cache_ttl_seconds: 5,
            rate_limit_per_minute: 7,
            ..Settings::default()
        };
        let config = AppConfig::from(&settings);
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.rate_limit_per_minute, 7);
    }

    #[test]
    fn new_state_is_empty() {
        let state = AppState::new();
        assert!(state.is_empty());
        assert!(state.ledger.read().is_empty());
    }
}
