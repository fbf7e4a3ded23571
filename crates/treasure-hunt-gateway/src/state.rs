//! Gateway shared state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use treasure_hunt_core::config::Config;
use treasure_hunt_pipeline::Pipeline;
use treasure_hunt_providers::ObjectStore;

/// Shared state accessible from all handlers.
///
/// Everything here is read-only after startup except the counters.
pub struct GatewayState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub analyses_total: AtomicU64,
    pub analyses_failed: AtomicU64,
    #[cfg(feature = "metrics")]
    pub metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl GatewayState {
    pub fn new(config: Arc<Config>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            config,
            pipeline,
            analyses_total: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
            #[cfg(feature = "metrics")]
            metrics_handle: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        self.pipeline.store()
    }

    pub fn hunter_name(&self) -> &str {
        self.config.hunter_name()
    }

    /// Count a finished analysis.
    pub fn record_analysis(&self, succeeded: bool) {
        self.analyses_total.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.analyses_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
