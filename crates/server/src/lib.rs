//! Voice Gateway Server
//!
//! HTTP and WebSocket surface for telephony calls:
//! - call-control webhook returning the media-stream document
//! - media-stream WebSocket, one `VoiceSession` per connection
//! - health and Prometheus metrics endpoints

pub mod http;
pub mod metrics;
pub mod state;
pub mod twiml;
pub mod websocket;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] voice_gateway_config::ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] voice_gateway_core::ProviderError),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
