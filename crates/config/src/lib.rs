//! Configuration management for the voice gateway
//!
//! Supports loading configuration from:
//! - TOML/YAML files
//! - Environment variables (`VOICE_GATEWAY__` prefix)
//! - Runtime overrides

pub mod audio;
pub mod providers;
pub mod settings;

pub use audio::AudioConfig;
pub use providers::{LlmConfig, LlmKind, SttConfig, SttKind, TtsConfig, TtsKind};
pub use settings::{load_settings, read_settings, ObservabilityConfig, ServerConfig, Settings};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
