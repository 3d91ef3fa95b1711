//! Prometheus metrics for the embed server

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::OnceLock;

/// Initialize all metric descriptions
pub fn init_metrics() {
    describe_counter!(
        "quizme_embed_requests_total",
        "Total number of embed data requests by decision"
    );
    describe_counter!(
        "quizme_domain_registrations_total",
        "Total number of domain registrations by outcome"
    );
    describe_counter!("quizme_errors_total", "Total number of API errors by kind");
    describe_histogram!(
        "quizme_embed_latency_seconds",
        "Embed data request latency in seconds"
    );
    describe_gauge!("quizme_loaded_quizzes", "Number of quizzes in the store");
}

/// Record an embed data request
pub fn record_embed_request(decision: &str, latency_seconds: f64) {
    counter!("quizme_embed_requests_total", "decision" => decision.to_string()).increment(1);
    histogram!("quizme_embed_latency_seconds").record(latency_seconds);
}

/// Record a domain registration
pub fn record_domain_registration(outcome: &str) {
    counter!("quizme_domain_registrations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an error response
pub fn record_error(kind: &str) {
    counter!("quizme_errors_total", "kind" => kind.to_string()).increment(1);
}

/// Update the store size gauge
pub fn update_loaded_quizzes(count: usize) {
    gauge!("quizme_loaded_quizzes").set(count as f64);
}

static PROMETHEUS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

/// Install the Prometheus recorder
pub fn init_prometheus() -> anyhow::Result<()> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;
    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Prometheus recorder already installed"))?;
    Ok(())
}

/// Render metrics in Prometheus text format
pub fn render() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Prometheus metrics not initialized\n".to_string())
}
