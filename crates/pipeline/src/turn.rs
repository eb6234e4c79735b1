//! Turn state machine
//!
//! ```text
//! Connected -> Listening <-> Transcribing -> Thinking -> Speaking -> Listening
//!                  ^                                         |
//!                  +------------- barge-in ------------------+
//! ```
//!
//! `Connected` is only ever the initial state. No locking happens here; the
//! owner serializes access.

use std::sync::Arc;

use serde_json::json;
use voice_gateway_core::{EventLevel, ObserverEvent, SessionObserver, TurnState};

pub struct TurnStateMachine {
    current: TurnState,
    session_id: String,
    observer: Arc<dyn SessionObserver>,
}

impl TurnStateMachine {
    pub fn new(session_id: impl Into<String>, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            current: TurnState::Connected,
            session_id: session_id.into(),
            observer,
        }
    }

    pub fn current(&self) -> TurnState {
        self.current
    }

    /// Move to `next`, reporting `{from, to}` to the observer.
    ///
    /// Returns false (and reports nothing) when already in `next`, or when
    /// `next` is `Connected`.
    pub fn transition(&mut self, next: TurnState) -> bool {
        if next == self.current {
            return false;
        }
        if next == TurnState::Connected {
            tracing::warn!(
                session_id = %self.session_id,
                from = %self.current,
                "Ignoring transition back to CONNECTED"
            );
            return false;
        }

        self.observer.emit(
            ObserverEvent::new(self.session_id.clone(), EventLevel::Info, "state-transition")
                .with_payload(json!({ "from": self.current, "to": next })),
        );
        self.current = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ObserverEvent>>);

    impl SessionObserver for Recorder {
        fn emit(&self, event: ObserverEvent) {
            self.0.lock().push(event);
        }
    }

    #[test]
    fn test_starts_connected() {
        let machine = TurnStateMachine::new("s1", Arc::new(Recorder::default()));
        assert_eq!(machine.current(), TurnState::Connected);
    }

    #[test]
    fn test_same_state_is_silent() {
        let recorder = Arc::new(Recorder::default());
        let mut machine = TurnStateMachine::new("s1", recorder.clone());

        assert!(machine.transition(TurnState::Listening));
        assert!(!machine.transition(TurnState::Listening));

        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[test]
    fn test_transition_reports_from_and_to() {
        let recorder = Arc::new(Recorder::default());
        let mut machine = TurnStateMachine::new("s1", recorder.clone());

        machine.transition(TurnState::Listening);
        machine.transition(TurnState::Transcribing);

        let events = recorder.0.lock();
        assert_eq!(events.len(), 2);
        let payload = events[1].payload.as_ref().unwrap();
        assert_eq!(payload["from"], "LISTENING");
        assert_eq!(payload["to"], "TRANSCRIBING");
        assert_eq!(events[1].name, "state-transition");
        assert_eq!(events[1].session_id, "s1");
        assert_eq!(machine.current(), TurnState::Transcribing);
    }

    #[test]
    fn test_connected_is_never_reentered() {
        let recorder = Arc::new(Recorder::default());
        let mut machine = TurnStateMachine::new("s1", recorder.clone());

        machine.transition(TurnState::Speaking);
        assert!(!machine.transition(TurnState::Connected));
        assert_eq!(machine.current(), TurnState::Speaking);
        assert_eq!(recorder.0.lock().len(), 1);
    }
}
