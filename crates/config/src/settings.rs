//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::providers::validate_providers;
use crate::{AudioConfig, ConfigError, LlmConfig, SttConfig, TtsConfig};

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    /// Media stream format and endpointing thresholds
    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub stt: SttConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audio.validate()?;
        validate_providers(&self.stt, &self.llm, &self.tts)?;

        if !self.server.stream_path.starts_with('/') {
            return Err(ConfigError::invalid("server.stream_path", "must start with '/'"));
        }
        if !self.server.incoming_path.starts_with('/') {
            return Err(ConfigError::invalid("server.incoming_path", "must start with '/'"));
        }
        if self.server.stream_token.is_empty() {
            tracing::warn!("server.stream_token is empty; stream connections are unauthenticated");
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path answering call-control webhooks
    #[serde(default = "default_incoming_path")]
    pub incoming_path: String,

    /// WebSocket path for the media stream
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Public URL the telephony provider connects the stream to
    #[serde(default)]
    pub stream_url: Option<String>,

    /// Shared secret the stream must present as `?token=`
    #[serde(default = "default_stream_token")]
    pub stream_token: String,

    #[serde(default = "default_stream_name")]
    pub stream_name: String,

    /// Spoken before the stream starts; empty to skip
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9000
}
fn default_incoming_path() -> String {
    "/twilio/incoming".to_string()
}
fn default_stream_path() -> String {
    "/twilio/stream".to_string()
}
fn default_stream_token() -> String {
    "luther-secret".to_string()
}
fn default_stream_name() -> String {
    "luther-session".to_string()
}
fn default_greeting() -> String {
    "Hold tight, connecting you to Luther.".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            incoming_path: default_incoming_path(),
            stream_path: default_stream_path(),
            stream_url: None,
            stream_token: default_stream_token(),
            stream_name: default_stream_name(),
            greeting: default_greeting(),
        }
    }
}

impl ServerConfig {
    /// Stream URL, falling back to a local `wss://` address
    pub fn resolved_stream_url(&self) -> String {
        match &self.stream_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("wss://localhost:{}{}", self.port, self.stream_path),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Serve Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (VOICE_GATEWAY__ prefix, `__` separated)
/// 2. config/{env}.toml|yaml (if env specified)
/// 3. config/default.toml|yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let settings = read_settings(env)?;
    settings.validate()?;
    Ok(settings)
}

/// Merge every source without validating, so the caller can install logging
/// before `validate` reports its warnings
pub fn read_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICE_GATEWAY")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    Ok(config.try_deserialize()?)
}
