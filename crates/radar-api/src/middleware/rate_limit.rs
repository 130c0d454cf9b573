//! # Per-Client Rate Limiting
//!
//! Fixed-window limiter keyed by the `x-client-id` header. Requests without
//! the header share the `anonymous` bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parking_lot::Mutex;

use crate::error::ErrorBody;

/// Header carrying the client key.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u64,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// `per_minute` requests per 60-second window.
    pub fn per_minute(per_minute: u32) -> Self {
        Self {
            max_requests: u64::from(per_minute),
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u64,
    started: Instant,
}

/// Shared limiter state.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    /// Limiter with `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(window.started) >= self.config.window {
            window.count = 0;
            window.started = now;
        }
        if window.count >= self.config.max_requests {
            false
        } else {
            window.count += 1;
            true
        }
    }

    /// Count a request for `key`; `false` once the window is exhausted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }
}

/// Reject with 429 `RATE_LIMITED` when the caller's window is exhausted.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if let Some(limiter) = request.extensions().get::<RateLimiter>().cloned() {
        let key = request
            .headers()
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("anonymous");

        if !limiter.check(key) {
            tracing::warn!(client = key, "rate limit exceeded");
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody::new("RATE_LIMITED", "rate limit exceeded")),
            )
                .into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_exhausts_then_resets() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });
        let t0 = Instant::now();
        assert!(limiter.check_at("a", t0));
        assert!(limiter.check_at("a", t0));
        assert!(!limiter.check_at("a", t0));
        assert!(limiter.check_at("b", t0));
        assert!(limiter.check_at("a", t0 + Duration::from_secs(61)));
    }

    #[test]
    fn per_minute_config() {
        let c = RateLimitConfig::per_minute(30);
        assert_eq!(c.max_requests, 30);
        assert_eq!(c.window, Duration::from_secs(60));
    }
}
