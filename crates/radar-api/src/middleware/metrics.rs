//! # Prometheus Metrics
//!
//! HTTP request counters and latency histograms are recorded by
//! [`metrics_middleware`]. Domain gauges (policies, companies, active
//! assessments by risk level, predictions) are refreshed on each `/metrics`
//! scrape by the handler in `routes::health`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    core::Collector, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts,
    Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    policies_total: Gauge,
    companies_total: Gauge,
    assessments_active: GaugeVec,
    predictions_total: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Fresh registry with every metric registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("radar_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "radar_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("radar_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let policies_total = Gauge::new("radar_policies_total", "Policies in the registry")
            .expect("metric can be created");

        let companies_total = Gauge::new("radar_companies_total", "Companies in the registry")
            .expect("metric can be created");

        let assessments_active = GaugeVec::new(
            Opts::new("radar_assessments_active", "Active impact assessments by risk level"),
            &["risk_level"],
        )
        .expect("metric can be created");

        let predictions_total = Gauge::new("radar_predictions_total", "Issued predictions")
            .expect("metric can be created");

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(http_requests_total.clone()),
            Box::new(http_request_duration_seconds.clone()),
            Box::new(http_errors_total.clone()),
            Box::new(policies_total.clone()),
            Box::new(companies_total.clone()),
            Box::new(assessments_active.clone()),
            Box::new(predictions_total.clone()),
        ];
        for collector in collectors {
            registry
                .register(collector)
                .expect("metric can be registered");
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                policies_total,
                companies_total,
                assessments_active,
                predictions_total,
            }),
        }
    }

    /// Total requests recorded.
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Total 4xx and 5xx responses recorded.
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Policies gauge.
    pub fn policies_total(&self) -> &Gauge {
        &self.inner.policies_total
    }

    /// Companies gauge.
    pub fn companies_total(&self) -> &Gauge {
        &self.inner.companies_total
    }

    /// Active assessments by risk level.
    pub fn assessments_active(&self) -> &GaugeVec {
        &self.inner.assessments_active
    }

    /// Predictions gauge.
    pub fn predictions_total(&self) -> &Gauge {
        &self.inner.predictions_total
    }

    /// Gather all metrics in Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Replace UUID path segments with `{id}` to bound label cardinality.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let hyphenated = segment.len() == 36
                && segment.chars().enumerate().all(|(i, c)| {
                    if matches!(i, 8 | 13 | 18 | 23) {
                        c == '-'
                    } else {
                        c.is_ascii_hexdigit()
                    }
                });
            let simple = segment.len() == 32 && segment.chars().all(|c| c.is_ascii_hexdigit());
            if hyphenated || simple {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Record method, normalised path, status and latency for every request.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn counts_requests_and_errors() {
        let m = ApiMetrics::new();
        m.record_request("GET", "/api/v1/policies", 200, 0.01);
        m.record_request("GET", "/api/v1/policies/{id}", 404, 0.01);
        m.record_request("POST", "/api/v1/impacts/assess", 500, 0.2);
        assert_eq!(m.requests(), 3);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn clones_share_registry() {
        let m = ApiMetrics::new();
        let clone = m.clone();
        clone.record_request("GET", "/health", 200, 0.001);
        assert_eq!(m.requests(), 1);
    }

    #[test]
    fn encodes_domain_gauges() {
        let m = ApiMetrics::new();
        m.policies_total().set(12.0);
        m.assessments_active().with_label_values(&["high"]).set(3.0);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("radar_policies_total 12"));
        assert!(text.contains("radar_assessments_active{risk_level=\"high\"} 3"));
    }

    #[test]
    fn uuid_segments_normalised() {
        assert_eq!(
            normalize_path("/api/v1/policies/550e8400-e29b-41d4-a716-446655440000/changes"),
            "/api/v1/policies/{id}/changes"
        );
        assert_eq!(
            normalize_path("/api/v1/impacts/550e8400e29b41d4a716446655440000"),
            "/api/v1/impacts/{id}"
        );
        assert_eq!(normalize_path("/api/v1/dashboard/summary"), "/api/v1/dashboard/summary");
    }
}
