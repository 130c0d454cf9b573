//! # radar-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for PolicyRadar.
//! Binds to `RADAR_API_HOST:RADAR_API_PORT` (default `0.0.0.0:8000`).

use radar_api::bootstrap::{seed_from_dir, SeedOutcome};
use radar_api::state::{AppConfig, AppState};
use radar_core::Settings;
use tracing_subscriber::EnvFilter;

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("RADAR_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration must load before tracing so the log level applies.
    let settings = Settings::from_env()?;
    init_tracing(&settings);
    tracing::info!(settings = ?settings, "Configuration loaded");

    // Initialize database pool (optional; absent means in-memory only).
    let db_pool = radar_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(AppConfig::from(&settings), db_pool);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    // Bootstrap: load a generated dataset if RADAR_DATA_DIR is set.
    if let Some(dir) = &settings.data_dir {
        match seed_from_dir(&state, dir).await {
            Ok(SeedOutcome::Loaded { records }) => {
                tracing::info!(dir = %dir.display(), records, "Dataset loaded");
            }
            Ok(SeedOutcome::Skipped) => {}
            Err(e) => {
                tracing::error!(dir = %dir.display(), "Bootstrap failed: {e}");
                return Err(e.into());
            }
        }
    }

    let app = radar_api::app(state);

    let addr = settings.bind_addr();
    tracing::info!("PolicyRadar API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
