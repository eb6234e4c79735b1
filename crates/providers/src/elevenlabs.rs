//! ElevenLabs streaming synthesis, requested as raw PCM at the session's TTS rate

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use voice_gateway_config::TtsConfig;
use voice_gateway_core::{ProviderError, Stage, SynthesizeOptions, TextToSpeech};

use crate::{check_status, http_client, require_key, with_cancel};

const PROVIDER: &str = "elevenlabs";
const API_ROOT: &str = "https://api.elevenlabs.io/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

pub struct ElevenLabsTts {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabsTts {
    pub fn new(config: &TtsConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, REQUEST_TIMEOUT)?,
            api_key: require_key(PROVIDER, config.api_key.as_deref())?,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/text-to-speech/{}/stream", API_ROOT, self.voice_id)
    }

    async fn request(&self, text: &str, sample_rate: u32) -> Result<Vec<u8>, ProviderError> {
        let body = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("output_format", output_format(sample_rate))])
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        let audio = check_status(PROVIDER, response)
            .await?
            .bytes()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsTts {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesizeOptions,
    ) -> Result<Vec<u8>, ProviderError> {
        with_cancel(
            Stage::Synthesize,
            &options.cancel,
            self.request(text, options.sample_rate),
        )
        .await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

fn output_format(sample_rate: u32) -> String {
    format!("pcm_{sample_rate}")
}
