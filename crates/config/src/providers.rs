//! Capability-provider configuration
//!
//! Each capability picks one variant from a closed set. The choice is made
//! once at startup by the provider factory; API keys are plain config values.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttKind {
    #[default]
    Mock,
    Deepgram,
}

/// Response-generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmKind {
    #[default]
    Mock,
    OpenAi,
}

/// Speech-synthesis backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsKind {
    #[default]
    Mock,
    ElevenLabs,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    #[serde(default)]
    pub provider: SttKind,

    /// Language code sent with every request
    #[serde(default = "default_language")]
    pub language_code: String,

    /// Sample rate the provider expects
    #[serde(default = "default_provider_rate")]
    pub sample_rate: u32,

    /// Provider model name
    #[serde(default = "default_stt_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_language() -> String {
    "en-US".to_string()
}
fn default_provider_rate() -> u32 {
    16000
}
fn default_stt_model() -> String {
    "nova-2".to_string()
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            provider: SttKind::default(),
            language_code: default_language(),
            sample_rate: default_provider_rate(),
            model: default_stt_model(),
            api_key: None,
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmKind,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// OpenAI-compatible API root
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    512
}
fn default_system_prompt() -> String {
    "You are Luther, a confident but kind assistant helping a caller over the phone. \
     Keep responses concise but conversational."
        .to_string()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmKind::default(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            base_url: default_llm_base_url(),
            api_key: None,
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsKind,

    /// Sample rate requested from the provider
    #[serde(default = "default_provider_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_tts_model")]
    pub model_id: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}
fn default_tts_model() -> String {
    "eleven_turbo_v2".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsKind::default(),
            sample_rate: default_provider_rate(),
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            api_key: None,
        }
    }
}

pub(crate) fn validate_providers(
    stt: &SttConfig,
    llm: &LlmConfig,
    tts: &TtsConfig,
) -> Result<(), ConfigError> {
    if stt.sample_rate == 0 {
        return Err(ConfigError::invalid("stt.sample_rate", "must be positive"));
    }
    if tts.sample_rate == 0 {
        return Err(ConfigError::invalid("tts.sample_rate", "must be positive"));
    }
    if stt.language_code.trim().is_empty() {
        return Err(ConfigError::MissingField("stt.language_code".to_string()));
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::invalid("llm.temperature", "must be within 0.0..=2.0"));
    }
    Ok(())
}
