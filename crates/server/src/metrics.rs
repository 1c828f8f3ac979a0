//! Prometheus metrics for the control surface.
//!
//! HTTP request metrics live here; the engine's own counters come from
//! `restreamer_core::metrics` and are registered into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "restreamer_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("restreamer_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "restreamer_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// 1 until shutdown has been signalled.
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "restreamer_orchestrator_running",
        "Whether the orchestrator accepts new work",
    )
    .unwrap()
});

/// Supervised tasks not yet joined.
pub static ORCHESTRATOR_TASKS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "restreamer_orchestrator_tasks",
        "Supervised tasks (playback, download, refresh) still alive",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_TASKS.clone()))
        .unwrap();

    for metric in restreamer_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh gauges derived from the orchestrator before a scrape.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    ORCHESTRATOR_RUNNING.set(i64::from(status.running));
    ORCHESTRATOR_TASKS.set(status.tasks as i64);
}

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/-?\d+(/|$)").unwrap());

/// Normalize a path for metric labels (channel ids become `{id}`).
pub fn normalize_path(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, "/{id}$1").to_string()
}
