//! Speech capability traits

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ProviderError;

/// Options for a single transcription call
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Sample rate of the supplied PCM
    pub sample_rate: u32,
    /// BCP-47 language code, e.g. `en-US`
    pub language_code: String,
    pub cancel: CancellationToken,
}

/// Options for a single synthesis call
#[derive(Debug, Clone)]
pub struct SynthesizeOptions {
    /// Requested output sample rate
    pub sample_rate: u32,
    pub cancel: CancellationToken,
}

/// Speech-to-text provider
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe 16-bit little-endian mono PCM
    async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<String, ProviderError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Text-to-speech provider
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize text into 16-bit little-endian mono PCM at `options.sample_rate`
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesizeOptions,
    ) -> Result<Vec<u8>, ProviderError>;

    fn name(&self) -> &'static str;
}
