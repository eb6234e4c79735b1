//! Session observer interface
//!
//! The orchestrator reports lifecycle facts (state transitions, barge-in,
//! empty results, turn failures) through this trait. Where they end up
//! (log lines, metrics, a test recorder) is up to the implementation.

use serde::Serialize;
use serde_json::Value;

/// Severity of an observer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// One structured event emitted by a session
#[derive(Debug, Clone, Serialize)]
pub struct ObserverEvent {
    pub session_id: String,
    pub level: EventLevel,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ObserverEvent {
    pub fn new(session_id: impl Into<String>, level: EventLevel, name: &'static str) -> Self {
        Self {
            session_id: session_id.into(),
            level,
            name,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Sink for structured session events
pub trait SessionObserver: Send + Sync {
    fn emit(&self, event: ObserverEvent);
}

/// Observer that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn emit(&self, _event: ObserverEvent) {}
}
