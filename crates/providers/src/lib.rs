//! Capability providers for the voice gateway
//!
//! Implementations of the core `SpeechToText`, `LanguageModel` and
//! `TextToSpeech` traits:
//! - Mock providers (no network, deterministic shapes)
//! - Deepgram pre-recorded transcription
//! - OpenAI-compatible chat completions
//! - ElevenLabs streaming synthesis
//!
//! `ProviderFactory` picks one of each from `Settings`.

pub mod deepgram;
pub mod elevenlabs;
pub mod factory;
pub mod mock;
pub mod openai;

pub use deepgram::DeepgramStt;
pub use elevenlabs::ElevenLabsTts;
pub use factory::ProviderFactory;
pub use mock::{MockLlm, MockStt, MockTts};
pub use openai::OpenAiLlm;

use std::future::Future;
use std::time::Duration;

use voice_gateway_core::{CancellationToken, ProviderError, Stage};

/// Run a provider request until it finishes or `cancel` fires
pub(crate) async fn with_cancel<T, F>(
    stage: Stage,
    cancel: &CancellationToken,
    request: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled(stage)),
        result = request => result,
    }
}

pub(crate) fn http_client(
    provider: &'static str,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::request(provider, e))
}

/// Non-empty, trimmed API key or `MissingCredentials`
pub(crate) fn require_key(
    provider: &'static str,
    key: Option<&str>,
) -> Result<String, ProviderError> {
    key.map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::MissingCredentials(provider))
}

/// Map a non-2xx response to `ProviderError::Http`
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(provider, status = status.as_u16(), body = %body, "Provider request rejected");
    Err(ProviderError::Http {
        provider,
        status: status.as_u16(),
    })
}
