//! Provider selection
//!
//! Each capability is chosen once from its closed `*Kind` enum. Choosing a
//! hosted provider without credentials is an error, never a silent fallback
//! to the mock.

use std::sync::Arc;

use voice_gateway_config::{LlmConfig, LlmKind, Settings, SttConfig, SttKind, TtsConfig, TtsKind};
use voice_gateway_core::{LanguageModel, ProviderError, ProviderSet, SpeechToText, TextToSpeech};

use crate::{DeepgramStt, ElevenLabsTts, MockLlm, MockStt, MockTts, OpenAiLlm};

pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the provider set one session will drive
    pub fn create(settings: &Settings) -> Result<ProviderSet, ProviderError> {
        Ok(ProviderSet {
            stt: Self::create_stt(&settings.stt)?,
            llm: Self::create_llm(&settings.llm)?,
            tts: Self::create_tts(&settings.tts)?,
        })
    }

    pub fn create_stt(config: &SttConfig) -> Result<Arc<dyn SpeechToText>, ProviderError> {
        let provider: Arc<dyn SpeechToText> = match config.provider {
            SttKind::Mock => Arc::new(MockStt),
            SttKind::Deepgram => Arc::new(DeepgramStt::new(config)?),
        };
        tracing::debug!(provider = provider.name(), "STT provider ready");
        Ok(provider)
    }

    pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, ProviderError> {
        let provider: Arc<dyn LanguageModel> = match config.provider {
            LlmKind::Mock => Arc::new(MockLlm),
            LlmKind::OpenAi => Arc::new(OpenAiLlm::new(config)?),
        };
        tracing::debug!(provider = provider.name(), "LLM provider ready");
        Ok(provider)
    }

    pub fn create_tts(config: &TtsConfig) -> Result<Arc<dyn TextToSpeech>, ProviderError> {
        let provider: Arc<dyn TextToSpeech> = match config.provider {
            TtsKind::Mock => Arc::new(MockTts),
            TtsKind::ElevenLabs => Arc::new(ElevenLabsTts::new(config)?),
        };
        tracing::debug!(provider = provider.name(), "TTS provider ready");
        Ok(provider)
    }
}
