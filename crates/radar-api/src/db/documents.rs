//! JSONB document persistence.
//!
//! Each record set lives in its own table:
//!
//! ```text
//! id UUID PRIMARY KEY, body JSONB NOT NULL, created_at TIMESTAMPTZ, updated_at TIMESTAMPTZ
//! ```
//!
//! Mutable sets upsert on `id`. Append-only sets insert with
//! `ON CONFLICT DO NOTHING`, so a replayed write is a no-op and an existing
//! row is never rewritten.

use chrono::{DateTime, Utc};
use radar_core::{
    Company, CompanyProfile, EconomicIndicator, FinancialMetrics, ImpactAssessment, MarketData,
    Policy, PolicyCategory, PolicyChange, Prediction, PredictionOutcome, TradeFlow,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// A persisted record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    PolicyCategories,
    Policies,
    PolicyChanges,
    Companies,
    CompanyProfiles,
    FinancialMetrics,
    ImpactAssessments,
    Predictions,
    PredictionOutcomes,
    MarketData,
    EconomicIndicators,
    TradeFlows,
}

impl Collection {
    /// Table name.
    pub fn table(&self) -> &'static str {
        match self {
            Self::PolicyCategories => "policy_categories",
            Self::Policies => "policies",
            Self::PolicyChanges => "policy_changes",
            Self::Companies => "companies",
            Self::CompanyProfiles => "company_profiles",
            Self::FinancialMetrics => "financial_metrics",
            Self::ImpactAssessments => "impact_assessments",
            Self::Predictions => "predictions",
            Self::PredictionOutcomes => "prediction_outcomes",
            Self::MarketData => "market_data",
            Self::EconomicIndicators => "economic_indicators",
            Self::TradeFlows => "trade_flows",
        }
    }

    /// Whether rows are immutable once written.
    pub fn append_only(&self) -> bool {
        matches!(
            self,
            Self::PolicyChanges
                | Self::FinancialMetrics
                | Self::Predictions
                | Self::PredictionOutcomes
                | Self::MarketData
                | Self::EconomicIndicators
                | Self::TradeFlows
        )
    }
}

/// A record that can be stored as a JSONB document.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Table the record lives in.
    const COLLECTION: Collection;

    fn id(&self) -> Uuid;

    fn created_at(&self) -> DateTime<Utc>;

    /// Append-only records have no separate modification time.
    fn updated_at(&self) -> DateTime<Utc> {
        self.created_at()
    }
}

macro_rules! mutable_document {
    ($ty:ty, $collection:ident) => {
        impl Document for $ty {
            const COLLECTION: Collection = Collection::$collection;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn updated_at(&self) -> DateTime<Utc> {
                self.updated_at
            }
        }
    };
}

macro_rules! append_only_document {
    ($ty:ty, $collection:ident) => {
        impl Document for $ty {
            const COLLECTION: Collection = Collection::$collection;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

mutable_document!(PolicyCategory, PolicyCategories);
mutable_document!(Policy, Policies);
mutable_document!(Company, Companies);
mutable_document!(CompanyProfile, CompanyProfiles);
mutable_document!(ImpactAssessment, ImpactAssessments);
// Predictions carry `updated_at` but are never rewritten.
append_only_document!(Prediction, Predictions);
append_only_document!(PolicyChange, PolicyChanges);
append_only_document!(FinancialMetrics, FinancialMetrics);
append_only_document!(PredictionOutcome, PredictionOutcomes);
append_only_document!(MarketData, MarketData);
append_only_document!(EconomicIndicator, EconomicIndicators);
append_only_document!(TradeFlow, TradeFlows);

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<serde_json::Value>,
}

fn insert_sql(collection: Collection) -> String {
    let conflict = if collection.append_only() {
        "ON CONFLICT (id) DO NOTHING"
    } else {
        "ON CONFLICT (id) DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at"
    };
    format!(
        "INSERT INTO {} (id, body, created_at, updated_at) VALUES ($1, $2, $3, $4) {conflict}",
        collection.table()
    )
}

/// Write `record`, upserting or inserting-once per its collection.
pub async fn save<T: Document>(pool: &PgPool, record: &T) -> Result<(), sqlx::Error> {
    let body = serde_json::to_value(record).map_err(|e| {
        sqlx::Error::Protocol(format!(
            "failed to serialise {} {}: {e}",
            T::COLLECTION.table(),
            record.id()
        ))
    })?;

    sqlx::query(&insert_sql(T::COLLECTION))
        .bind(record.id())
        .bind(Json(body))
        .bind(record.created_at())
        .bind(record.updated_at())
        .execute(pool)
        .await?;

    Ok(())
}

/// Load every row of `T`'s collection, oldest first.
pub async fn load_all<T: Document>(pool: &PgPool) -> Result<Vec<T>, sqlx::Error> {
    let sql = format!(
        "SELECT id, body FROM {} ORDER BY created_at, id",
        T::COLLECTION.table()
    );
    let rows = sqlx::query_as::<_, DocumentRow>(&sql)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row.body.0).map_err(|e| {
                sqlx::Error::Protocol(format!(
                    "corrupt {} row {}: {e}",
                    T::COLLECTION.table(),
                    row.id
                ))
            })
        })
        .collect()
}
