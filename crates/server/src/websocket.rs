//! Media-stream WebSocket
//!
//! Each accepted connection owns one `VoiceSession`. Inbound frames are
//! handed to the session in arrival order; outbound media goes through a
//! channel to a single writer task that owns the socket's send half.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use voice_gateway_core::ProviderSet;
use voice_gateway_pipeline::{SessionConfig, VoiceSession};
use voice_gateway_providers::ProviderFactory;
use voice_gateway_transport::ChannelSink;

use crate::metrics::{record_session_closed, record_session_opened, record_stream_rejected};
use crate::state::AppState;

/// Outbound messages buffered ahead of the socket writer
const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET <stream_path>?token=...`
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> Response {
    if !token_matches(&state.settings.server.stream_token, query.token.as_deref()) {
        tracing::warn!("Rejected media stream: invalid token");
        record_stream_rejected("token");
        return StatusCode::FORBIDDEN.into_response();
    }

    let providers = match ProviderFactory::create(&state.settings) {
        Ok(providers) => providers,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build providers for media stream");
            record_stream_rejected("providers");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, providers))
}

/// An empty configured token accepts every stream
pub fn token_matches(expected: &str, presented: Option<&str>) -> bool {
    expected.is_empty() || presented == Some(expected)
}

async fn handle_socket(socket: WebSocket, state: AppState, providers: ProviderSet) {
    let session_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (sink, mut outbound) = ChannelSink::channel(OUTBOUND_BUFFER);

    let mut session = VoiceSession::new(
        session_id.clone(),
        SessionConfig::from_settings(&state.settings),
        providers,
        Arc::new(sink),
        state.observer.clone(),
    );
    record_session_opened();

    // Ends once every sink clone is gone, i.e. when the turn task exits
    let writer_session = session_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(session_id = %writer_session, error = %e, "Failed to encode outbound media");
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::Text(text)).await {
                tracing::debug!(session_id = %writer_session, error = %e, "Media stream writer stopped");
                break;
            }
        }
        if let Err(e) = ws_tx.close().await {
            tracing::debug!(session_id = %writer_session, error = %e, "Media stream already closed");
        }
    });

    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => session.on_frame(text.as_bytes()),
            Ok(Message::Binary(data)) => session.on_frame(&data),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Err(e) => {
                tracing::debug!(session_id = %session_id, error = %e, "Media stream read failed");
                break;
            }
        }
        if session.is_closed() {
            break;
        }
    }

    session.close();
    session.drain().await;
    if let Err(e) = writer.await {
        tracing::warn!(session_id = %session_id, error = %e, "Media stream writer panicked");
    }
    record_session_closed();
}
