//! Media stream message types
//!
//! Inbound events are tagged by an `event` field. Unknown event names are
//! not errors: they parse to `InboundMessage::Unknown` so the session can log
//! and ignore them. Field names follow the generic `callId` / `streamId`
//! shape; the Twilio spellings (`callSid` / `streamSid`) are accepted too.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::TransportError;

/// One parsed inbound transport message
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Start(StartMessage),
    Media(MediaMessage),
    Stop(StopMessage),
    /// Well-formed JSON with an event name we do not handle
    Unknown { event: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartMessage {
    pub start: StartInfo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInfo {
    #[serde(alias = "callSid")]
    pub call_id: String,
    #[serde(alias = "streamSid")]
    pub stream_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    #[serde(default, alias = "streamSid")]
    pub stream_id: Option<String>,
    pub media: MediaPayload,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaPayload {
    /// Base64 law-encoded audio
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StopMessage {
    #[serde(default)]
    pub stop: StopInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StopInfo {
    #[serde(default)]
    pub reason: Option<String>,
}

impl MediaMessage {
    /// Decode the base64 payload into raw law bytes
    pub fn decode_payload(&self) -> Result<Vec<u8>, TransportError> {
        BASE64
            .decode(self.media.payload.as_bytes())
            .map_err(|e| TransportError::InvalidPayload(e.to_string()))
    }
}

/// Parse one raw transport message
pub fn parse_inbound(raw: &[u8]) -> Result<InboundMessage, TransportError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| TransportError::Malformed(e.to_string()))?;

    let event = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::Malformed("missing string field `event`".to_string()))?
        .to_string();

    let message = match event.as_str() {
        "start" => InboundMessage::Start(from_value(value)?),
        "media" => InboundMessage::Media(from_value(value)?),
        "stop" => InboundMessage::Stop(from_value(value)?),
        _ => InboundMessage::Unknown { event },
    };

    Ok(message)
}

fn from_value<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::Malformed(e.to_string()))
}

/// Outbound message written back to the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundMessage {
    Media {
        #[serde(rename = "streamId", skip_serializing_if = "Option::is_none")]
        stream_id: Option<String>,
        media: OutboundMedia,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMedia {
    /// Base64 law-encoded audio
    pub payload: String,
}

impl OutboundMessage {
    /// Build a media message from raw law bytes
    pub fn media(stream_id: Option<String>, law: &[u8]) -> Self {
        Self::Media {
            stream_id,
            media: OutboundMedia {
                payload: BASE64.encode(law),
            },
        }
    }

    /// Raw law bytes carried by a media message
    pub fn law_payload(&self) -> Result<Vec<u8>, TransportError> {
        match self {
            Self::Media { media, .. } => BASE64
                .decode(media.payload.as_bytes())
                .map_err(|e| TransportError::InvalidPayload(e.to_string())),
        }
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
