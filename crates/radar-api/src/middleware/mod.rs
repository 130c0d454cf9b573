//! # HTTP Middleware
//!
//! ```text
//! TraceLayer → metrics → auth → rate limit → handler
//! ```

pub mod metrics;
pub mod rate_limit;
