//! Prometheus metrics
//!
//! Session event counters are recorded by the pipeline's `TracingObserver`;
//! this module installs the recorder and tracks connection-level numbers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

/// Install the global Prometheus recorder. Call once at startup.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    describe_counter!(
        "voice_gateway_session_events_total",
        "Session lifecycle events by name"
    );
    describe_counter!("voice_gateway_sessions_total", "Media streams accepted");
    describe_counter!(
        "voice_gateway_stream_rejections_total",
        "Media streams refused at upgrade"
    );
    describe_gauge!("voice_gateway_sessions_active", "Media streams currently open");
    gauge!("voice_gateway_sessions_active").set(0.0);

    Ok(handle)
}

pub fn record_session_opened() {
    counter!("voice_gateway_sessions_total").increment(1);
    gauge!("voice_gateway_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    gauge!("voice_gateway_sessions_active").decrement(1.0);
}

pub fn record_stream_rejected(reason: &'static str) {
    counter!("voice_gateway_stream_rejections_total", "reason" => reason).increment(1);
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
