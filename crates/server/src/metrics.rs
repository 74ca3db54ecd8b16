//! Prometheus metrics for the Larder server.
//!
//! Exposes counters for update outcomes and reads, and the latency of applying
//! an update.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no record content or version tokens, only aggregate counts.
//! Restrict `/metrics` to scraper addresses at the network level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Update metrics
pub static UPDATES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "larder_updates_total",
            "Total number of update requests by outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static UPDATE_ENTRIES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "larder_update_entries_total",
            "Total number of schema version records written, by action",
        ),
        &["action"],
    )
    .expect("metric creation failed")
});

pub static UPDATE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "larder_update_duration_seconds",
            "Time taken to apply an authorized update",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("metric creation failed")
});

// Read metrics
pub static READS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("larder_reads_total", "Total number of read requests by kind"),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static CONTENT_BYTES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "larder_content_bytes_served_total",
        "Total bytes of record content served",
    )
    .expect("metric creation failed")
});

pub static TRUSTED_KEYS: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "larder_trusted_keys",
        "Number of public keys currently trusted to sign updates",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPDATES_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPDATE_ENTRIES_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPDATE_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(READS_TOTAL.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CONTENT_BYTES_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TRUSTED_KEYS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Helper to record the outcome of an update request.
pub fn record_update_outcome(outcome: &str) {
    UPDATES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper to record a read request by kind.
pub fn record_read(kind: &str) {
    READS_TOTAL.with_label_values(&[kind]).inc();
}
