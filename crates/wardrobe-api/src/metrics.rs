//! Prometheus metrics for the API server.
//!
//! Flow-level metrics (stage transitions, backend failures, sessions) are
//! recorded by `wardrobe_flow::metrics`; this module owns the recorder and
//! the HTTP request metrics.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "wardrobe_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "wardrobe_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "wardrobe_http_requests_in_flight";
    pub const SESSIONS_REAPED_TOTAL: &str = "wardrobe_sessions_reaped_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_sessions_reaped(count: usize) {
    counter!(names::SESSIONS_REAPED_TOTAL).increment(count as u64);
}

fn patterns() -> &'static [(Regex, &'static str); 3] {
    static PATTERNS: OnceLock<[(Regex, &'static str); 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |re: &str| Regex::new(re).expect("valid path pattern");
        [
            (
                compile(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"),
                ":id",
            ),
            (compile(r"/regions/[0-9]+"), "/regions/:region"),
            (compile(r"/wardrobe/[^/]+"), "/wardrobe/:item_id"),
        ]
    })
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    patterns()
        .iter()
        .fold(path.to_string(), |path, (re, replacement)| {
            re.replace_all(&path, *replacement).into_owned()
        })
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
