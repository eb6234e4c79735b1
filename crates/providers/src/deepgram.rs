//! Deepgram pre-recorded transcription
//!
//! One `POST /v1/listen` per utterance with the raw PCM as the body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use voice_gateway_config::SttConfig;
use voice_gateway_core::{ProviderError, SpeechToText, Stage, TranscribeOptions};

use crate::{check_status, http_client, require_key, with_cancel};

const PROVIDER: &str = "deepgram";
const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DeepgramStt {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl DeepgramStt {
    pub fn new(config: &SttConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, REQUEST_TIMEOUT)?,
            api_key: require_key(PROVIDER, config.api_key.as_deref())?,
            model: config.model.clone(),
            url: LISTEN_URL.to_string(),
        })
    }

    async fn request(&self, audio: &[u8], options: &TranscribeOptions) -> Result<String, ProviderError> {
        let sample_rate = options.sample_rate.to_string();
        let query = [
            ("model", self.model.as_str()),
            ("language", options.language_code.as_str()),
            ("sample_rate", sample_rate.as_str()),
            ("encoding", "linear16"),
            ("diarize", "true"),
        ];

        let response = self
            .client
            .post(&self.url)
            .query(&query)
            .header(AUTHORIZATION, format!("Token {}", self.api_key))
            .header(CONTENT_TYPE, "audio/raw")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        let body: Value = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;

        Ok(transcript_from(&body))
    }
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<String, ProviderError> {
        with_cancel(Stage::Transcribe, &options.cancel, self.request(audio, options)).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// First alternative of the first channel; empty when absent
fn transcript_from(body: &Value) -> String {
    body.pointer("/results/channels/0/alternatives/0/transcript")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
