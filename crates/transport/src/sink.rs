//! Outbound media sinks

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{OutboundMessage, TransportError};

/// Destination for paced outbound frames
#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Deliver one message; `SessionClosed` once the peer is gone
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;
}

/// Sink that forwards messages to a single writer task over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelSink {
    /// Create a sink and the receiver the writer task drains
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl MediaSink for ChannelSink {
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| TransportError::SessionClosed)
    }
}
