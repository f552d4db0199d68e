// Prometheus metrics for the puzzle backend.

use std::sync::Once;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("puzzle_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "puzzle_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0]),
        &["endpoint"],
    )
    .unwrap();

    /// Highscore submissions, by result (updated, rejected).
    pub static ref HIGHSCORE_UPDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("puzzle_highscore_updates_total", "Highscore submissions"),
        &["result"],
    )
    .unwrap();

    /// Level definitions returned to clients.
    pub static ref LEVELS_SERVED_TOTAL: IntCounter = IntCounter::new(
        "puzzle_levels_served_total",
        "Level definitions served",
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(API_REQUESTS_TOTAL.clone()),
            Box::new(API_REQUEST_DURATION_SECONDS.clone()),
            Box::new(HIGHSCORE_UPDATES_TOTAL.clone()),
            Box::new(LEVELS_SERVED_TOTAL.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::error!("Failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware recording request count and latency per endpoint.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => normalize_path(req.uri().path()),
    };
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(start.elapsed().as_secs_f64());
    API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();

    response
}
