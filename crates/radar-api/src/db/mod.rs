//! # Database Persistence Layer
//!
//! Optional PostgreSQL write-through for every PolicyRadar record set.
//!
//! When `DATABASE_URL` is set, each in-memory write is followed by a write
//! to the matching table and the stores are hydrated from the database on
//! startup. When absent, the API runs in in-memory mode: state does not
//! survive restarts.
//!
//! Every table has the same shape, `(id, body JSONB, created_at,
//! updated_at)`; see [`documents`].

pub mod documents;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect to `DATABASE_URL` and run the embedded migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, running in in-memory mode; state will not survive restarts"
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
