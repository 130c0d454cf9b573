//! # Analytics Response Cache
//!
//! Analytics, trends, risk-analysis and dashboard responses are pure
//! functions of the stores, so they are cached as JSON values under a key
//! built from the endpoint and its query. Every write clears the cache.
//!
//! Entries are also tagged with a write generation. A response computed
//! before a write lands under the old generation, where no later read will
//! look, so it can never be served after the write.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;

use crate::error::AppError;

const MAX_ENTRIES: u64 = 1_000;

/// TTL cache of serialised analytics responses.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<(u64, String), serde_json::Value>,
    generation: Arc<AtomicU64>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.inner.entry_count())
            .field("generation", &self.generation())
            .finish()
    }
}

impl ResponseCache {
    /// Cache whose entries expire `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Return the cached value for `key`, or compute, store and return it.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: String,
        compute: F,
    ) -> Result<serde_json::Value, AppError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let key = (self.generation(), key);
        if let Some(hit) = self.inner.get(&key).await {
            tracing::debug!(key = %key.1, generation = key.0, "analytics cache hit");
            return Ok(hit);
        }
        let value = serde_json::to_value(compute().await?).map_err(|e| {
            AppError::Internal(format!("failed to serialise cached response: {e}"))
        })?;
        if key.0 == self.generation() {
            self.inner.insert(key, value.clone()).await;
        }
        Ok(value)
    }

    /// Drop every entry. Called after any write.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_call_hits_cache_until_invalidated() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(serde_json::json!({"n": 1}))
        };

        let a = cache.get_or_compute("k".into(), compute).await.unwrap();
        let b = cache.get_or_compute("k".into(), compute).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate_all();
        cache.get_or_compute("k".into(), compute).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn write_during_compute_is_not_masked() {
        let cache = ResponseCache::new(Duration::from_secs(3600));
        let writer = &cache;
        let first = cache
            .get_or_compute("dashboard".into(), move || async move {
                // A write lands while the response is being built.
                writer.invalidate_all();
                Ok::<_, AppError>(1)
            })
            .await
            .unwrap();
        assert_eq!(first, serde_json::json!(1));

        let after_write = cache
            .get_or_compute("dashboard".into(), || async { Ok::<_, AppError>(2) })
            .await
            .unwrap();
        assert_eq!(after_write, serde_json::json!(2));
        assert_eq!(cache.generation(), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let failed = cache
            .get_or_compute("k".into(), || async {
                Err::<serde_json::Value, _>(AppError::Validation("bad".into()))
            })
            .await;
        assert!(failed.is_err());
        let ok = cache
            .get_or_compute("k".into(), || async { Ok::<_, AppError>(1) })
            .await
            .unwrap();
        assert_eq!(ok, serde_json::json!(1));
    }
}
