//! Conversational turn states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in the conversational cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnState {
    /// Stream accepted, no caller speech seen yet
    Connected,
    /// Capturing (or waiting for) caller speech
    Listening,
    /// Utterance handed to speech-to-text
    Transcribing,
    /// Transcript handed to the language model
    Thinking,
    /// Reply being synthesized and played back
    Speaking,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Connected => "CONNECTED",
            TurnState::Listening => "LISTENING",
            TurnState::Transcribing => "TRANSCRIBING",
            TurnState::Thinking => "THINKING",
            TurnState::Speaking => "SPEAKING",
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::Connected
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
