//! Prometheus metrics recording and endpoint.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use treasure_hunt_core::error::Stage;
use treasure_hunt_pipeline::StageObserver;

/// Install the Prometheus metrics recorder and return the handle for rendering.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))
}

fn outcome(succeeded: bool) -> &'static str {
    if succeeded { "success" } else { "failure" }
}

/// Record a finished analyze request with its duration.
pub fn record_analyze(succeeded: bool, duration_secs: f64) {
    let labels = [("outcome", outcome(succeeded).to_string())];
    metrics::counter!("analyze_requests_total", &labels).increment(1);
    metrics::histogram!("analyze_duration_seconds", &labels).record(duration_secs);
}

/// Record one pipeline stage.
pub fn record_stage(stage: Stage, succeeded: bool, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    metrics::histogram!("pipeline_stage_duration_seconds", &labels).record(duration_secs);
    if !succeeded {
        metrics::counter!("pipeline_failures_total", &labels).increment(1);
    }
}

/// Record an image listing or download.
pub fn record_image_request(kind: &str) {
    let labels = [("kind", kind.to_string())];
    metrics::counter!("image_requests_total", &labels).increment(1);
}

/// Feeds pipeline stage timings into the recorder.
pub struct MetricsObserver;

impl StageObserver for MetricsObserver {
    fn stage_finished(&self, stage: Stage, elapsed: Duration, succeeded: bool) {
        record_stage(stage, succeeded, elapsed.as_secs_f64());
    }
}
