//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use voice_gateway_config::Settings;
use voice_gateway_core::SessionObserver;
use voice_gateway_pipeline::TracingObserver;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Receives every session's lifecycle events
    pub observer: Arc<dyn SessionObserver>,
    /// Present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            settings: Arc::new(settings),
            observer: Arc::new(TracingObserver),
            metrics,
        }
    }
}
