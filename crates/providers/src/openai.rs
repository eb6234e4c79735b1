//! OpenAI-compatible chat completions
//!
//! Works against any endpoint that speaks `POST {base}/chat/completions`.
//! Each turn is a single system + user exchange; no history is kept.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voice_gateway_config::LlmConfig;
use voice_gateway_core::{GenerateOptions, LanguageModel, ProviderError, Stage};

use crate::{check_status, http_client, require_key, with_cancel};

const PROVIDER: &str = "openai";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First choice's content, trimmed; empty when absent
    fn reply(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

pub struct OpenAiLlm {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

impl OpenAiLlm {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, REQUEST_TIMEOUT)?,
            api_key: require_key(PROVIDER, config.api_key.as_deref())?,
            endpoint: completions_url(&config.base_url),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        })
    }

    async fn request(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;

        let parsed: ChatResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e))?;

        Ok(parsed.reply())
    }
}

#[async_trait]
impl LanguageModel for OpenAiLlm {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        with_cancel(Stage::Generate, &options.cancel, self.request(prompt)).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

/// Accepts either an API root or a full completions URL
fn completions_url(base_url: &str) -> String {
    let root = base_url
        .trim_end_matches('/')
        .trim_end_matches("/chat/completions");
    format!("{}/chat/completions", root.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.openai.com/v1"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://gateway.local/v1/"),
            "https://gateway.local/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://gateway.local/v1/chat/completions"),
            "https://gateway.local/v1/chat/completions"
        );
    }

    #[test]
    fn test_reply_extraction() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Sure thing.  "}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.reply(), "Sure thing.");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.reply(), "");

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(null_content.reply(), "");
    }

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            temperature: 0.3,
            max_tokens: 512,
            messages: [
                ChatMessage { role: "system", content: "be brief" },
                ChatMessage { role: "user", content: "hello" },
            ],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["max_tokens"], 512);
    }

    #[test]
    fn test_requires_api_key() {
        let mut config = LlmConfig::default();
        assert!(OpenAiLlm::new(&config).is_err());

        config.api_key = Some("sk-test".to_string());
        let llm = OpenAiLlm::new(&config).unwrap();
        assert_eq!(llm.endpoint, "https://api.openai.com/v1/chat/completions");
    }
}
