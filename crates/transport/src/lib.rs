//! Voice Gateway Transport Layer
//!
//! Message shapes spoken over the telephony media stream:
//! - Inbound `start` / `media` / `stop` events (JSON, one per message)
//! - Outbound `media` events carrying base64 law-encoded frames
//!
//! The WebSocket itself lives in the server crate; the session only sees a
//! `MediaSink`.

pub mod messages;
pub mod sink;

pub use messages::{
    parse_inbound, InboundMessage, MediaMessage, MediaPayload, OutboundMedia, OutboundMessage,
    StartMessage, StopMessage,
};
pub use sink::{ChannelSink, MediaSink};

use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Invalid media payload: {0}")]
    InvalidPayload(String),

    #[error("Session closed")]
    SessionClosed,
}

impl From<TransportError> for voice_gateway_core::Error {
    fn from(err: TransportError) -> Self {
        voice_gateway_core::Error::Transport(err.to_string())
    }
}
