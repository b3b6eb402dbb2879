//! HTTP-level metrics middleware and the `/metrics` Prometheus exposition
//! route, folded into the main router rather than served on a second port.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const EXPONENTIAL_SECONDS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets(EXPONENTIAL_SECONDS)
        .expect("bucket boundaries are statically valid")
        .install_recorder()
        .expect("a global metrics recorder is installed exactly once")
}

pub fn metrics_route(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

/// Records request count and latency, labeled by method/path/status. There
/// is no tower-http metrics middleware yet, so this mirrors the pattern the
/// rest of the stack uses for it by hand.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched) = req.extensions().get::<MatchedPath>() {
        matched.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();
    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
