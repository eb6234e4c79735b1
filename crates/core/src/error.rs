//! Error types for the voice gateway

use std::fmt;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the voice gateway
#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stage a provider call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Transcribe,
    Generate,
    Synthesize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcribe => "stt",
            Stage::Generate => "llm",
            Stage::Synthesize => "tts",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by capability providers
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The call was aborted through its cancellation token
    #[error("{0} call cancelled")]
    Cancelled(Stage),

    #[error("{provider} returned HTTP {status}")]
    Http { provider: &'static str, status: u16 },

    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{0} is selected but no API key is configured")]
    MissingCredentials(&'static str),
}

impl ProviderError {
    pub fn request(provider: &'static str, err: impl fmt::Display) -> Self {
        Self::Request {
            provider,
            message: err.to_string(),
        }
    }

    pub fn invalid_response(provider: &'static str, err: impl fmt::Display) -> Self {
        Self::InvalidResponse {
            provider,
            message: err.to_string(),
        }
    }

    /// Whether this error is an expected abort rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
