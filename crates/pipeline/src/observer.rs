//! Default session observer: structured logs plus event counters

use metrics::counter;
use voice_gateway_core::{EventLevel, ObserverEvent, SessionObserver};

/// Forwards session events to `tracing` and counts them by name
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn emit(&self, event: ObserverEvent) {
        counter!("voice_gateway_session_events_total", "event" => event.name).increment(1);

        let payload = event
            .payload
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default();

        match event.level {
            EventLevel::Info => tracing::info!(
                session_id = %event.session_id,
                event = event.name,
                payload = %payload,
                "session event"
            ),
            EventLevel::Warn => tracing::warn!(
                session_id = %event.session_id,
                event = event.name,
                payload = %payload,
                "session event"
            ),
            EventLevel::Error => tracing::error!(
                session_id = %event.session_id,
                event = event.name,
                payload = %payload,
                "session event"
            ),
        }
    }
}
