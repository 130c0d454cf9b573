//! # Dataset Bootstrap
//!
//! Seeds an empty deployment from a generated dataset directory.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Hydrate** from PostgreSQL, if configured (done by the caller).
//! 2. **Skip** if any policy or company is already loaded.
//! 3. **Load** the dataset via [`Dataset::load_dir`], which validates every record.
//! 4. **Write through** every loaded record when a database is configured.
//!
//! If `RADAR_DATA_DIR` is unset the server starts empty.

use std::path::Path;

use radar_synth::{Dataset, SynthError};

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during dataset bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The directory does not hold a readable, valid dataset.
    #[error("failed to load dataset: {0}")]
    Dataset(#[from] SynthError),

    /// A loaded record could not be written to the database.
    #[error("failed to persist dataset: {0}")]
    Persist(#[from] AppError),
}

/// What [`seed_from_dir`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Stores already held data; nothing was loaded.
    Skipped,
    /// The dataset was loaded.
    Loaded { records: usize },
}

/// Load the dataset at `dir` into `state` if the stores are empty.
pub async fn seed_from_dir(state: &AppState, dir: &Path) -> Result<SeedOutcome, BootstrapError> {
    if !state.is_empty() {
        tracing::info!(
            dir = %dir.display(),
            "Stores already populated, skipping dataset bootstrap"
        );
        return Ok(SeedOutcome::Skipped);
    }

    let dataset = Dataset::load_dir(dir)?;
    let records = dataset.total_records();

    if state.db_pool.is_some() {
        persist_dataset(state, &dataset).await?;
    }
    state.load_dataset(dataset);

    tracing::info!(
        dir = %dir.display(),
        records,
        policies = state.policies.len(),
        companies = state.companies.len(),
        assessments = state.ledger.read().len(),
        "Loaded dataset"
    );
    Ok(SeedOutcome::Loaded { records })
}

async fn persist_dataset(state: &AppState, dataset: &Dataset) -> Result<(), AppError> {
    state.persist_all(&dataset.policy_categories).await?;
    state.persist_all(&dataset.policies).await?;
    state.persist_all(&dataset.policy_changes).await?;
    state.persist_all(&dataset.companies).await?;
    state.persist_all(&dataset.company_profiles).await?;
    state.persist_all(&dataset.financial_metrics).await?;
    state.persist_all(&dataset.market_data).await?;
    state.persist_all(&dataset.economic_indicators).await?;
    state.persist_all(&dataset.trade_flows).await?;
    state.persist_all(&dataset.impact_assessments).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_synth::{write_dir, GeneratorConfig, SyntheticGenerator};

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            policies: 12,
            companies: 8,
            market_days: 10,
            ..GeneratorConfig::default()
        }
    }

    #[tokio::test]
    async fn seeds_empty_state_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();
        let dataset = SyntheticGenerator::new(config.clone())
            .unwrap()
            .generate()
            .unwrap();
        let summary = dataset.summary(config.seed, config.start, config.end, chrono::Utc::now());
        write_dir(&dataset, dir.path(), &summary).unwrap();

        let state = AppState::new();
        let outcome = seed_from_dir(&state, dir.path()).await.unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Loaded {
                records: dataset.total_records()
            }
        );
        assert_eq!(state.policies.len(), 12);
        assert_eq!(state.companies.len(), 8);
        assert_eq!(state.ledger.read().len(), dataset.impact_assessments.len());

        let again = seed_from_dir(&state, dir.path()).await.unwrap();
        assert_eq!(again, SeedOutcome::Skipped);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let state = AppState::new();
        let err = seed_from_dir(&state, Path::new("/nonexistent/radar-dataset"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Dataset(_)));
    }
}
