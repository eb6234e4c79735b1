//! HTTP Endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::twiml;
use crate::websocket::stream_handler;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        // Telephony provider webhooks
        .route(&settings.server.incoming_path, post(incoming_call))
        .route(&settings.server.stream_path, get(stream_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Voice gateway is ready"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Incoming-call webhook: reply with the media-stream document
async fn incoming_call(State(state): State<AppState>) -> Response {
    tracing::info!("Incoming call, opening media stream");
    match twiml::render(&state.settings.server) {
        Ok(doc) => ([(header::CONTENT_TYPE, "text/xml")], doc).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render call-control document");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
