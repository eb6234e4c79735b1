//! Offline providers
//!
//! Useful for exercising the call path end to end without credentials. The
//! shapes are fixed: a timestamped transcript, an echoing reply, and a sine
//! tone whose length tracks the reply.

use std::f64::consts::PI;

use async_trait::async_trait;
use chrono::Utc;
use voice_gateway_core::{
    GenerateOptions, LanguageModel, ProviderError, SpeechToText, Stage, SynthesizeOptions,
    TextToSpeech, TranscribeOptions,
};

use crate::with_cancel;

const ECHO_CHARS: usize = 150;
const TONE_AMPLITUDE: f64 = 0.2 * i16::MAX as f64;

#[derive(Debug, Default, Clone, Copy)]
pub struct MockStt;

#[async_trait]
impl SpeechToText for MockStt {
    async fn transcribe(
        &self,
        _audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<String, ProviderError> {
        with_cancel(Stage::Transcribe, &options.cancel, async {
            Ok(format!(
                "Mock transcript [{}] ({} Hz, {})",
                Utc::now().to_rfc3339(),
                options.sample_rate,
                options.language_code
            ))
        })
        .await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockLlm;

#[async_trait]
impl LanguageModel for MockLlm {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        with_cancel(Stage::Generate, &options.cancel, async {
            let summary: String = prompt.trim().chars().take(ECHO_CHARS).collect();
            Ok(format!(
                "Mock answer: I understood \"{summary}\". How can I help you further?"
            ))
        })
        .await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MockTts;

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesizeOptions,
    ) -> Result<Vec<u8>, ProviderError> {
        with_cancel(Stage::Synthesize, &options.cancel, async {
            Ok(tone_for(text, options.sample_rate))
        })
        .await
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Sine tone, 0.5 s plus 40 ms per character, capped at 3 s
fn tone_for(text: &str, sample_rate: u32) -> Vec<u8> {
    let chars = text.chars().count();
    let duration = (0.5 + chars as f64 * 0.04).min(3.0);
    let samples = ((duration * sample_rate as f64).floor() as usize).max(1);
    let frequency = 220.0 + (chars % 5) as f64 * 40.0;

    (0..samples)
        .flat_map(|i| {
            let t = i as f64 / sample_rate as f64;
            let value = (TONE_AMPLITUDE * (2.0 * PI * frequency * t).sin()).round() as i16;
            value.to_le_bytes()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_gateway_core::CancellationToken;

    fn transcribe_options() -> TranscribeOptions {
        TranscribeOptions {
            sample_rate: 16000,
            language_code: "en-US".to_string(),
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn test_mock_stt_describes_request() {
        let text = MockStt.transcribe(&[0; 640], &transcribe_options()).await.unwrap();
        assert!(text.starts_with("Mock transcript ["));
        assert!(text.ends_with("(16000 Hz, en-US)"));
    }

    #[tokio::test]
    async fn test_mock_llm_truncates_echo() {
        let prompt = format!("  {}  ", "a".repeat(400));
        let reply = MockLlm.generate(&prompt, &GenerateOptions::default()).await.unwrap();
        assert_eq!(
            reply,
            format!("Mock answer: I understood \"{}\". How can I help you further?", "a".repeat(150))
        );
    }

    #[tokio::test]
    async fn test_mock_tts_duration() {
        let options = SynthesizeOptions {
            sample_rate: 16000,
            cancel: CancellationToken::new(),
        };

        // empty text: 0.5 s
        let audio = MockTts.synthesize("", &options).await.unwrap();
        assert_eq!(audio.len(), 8000 * 2);

        // long text is capped at 3 s
        let audio = MockTts.synthesize(&"x".repeat(200), &options).await.unwrap();
        assert_eq!(audio.len(), 48000 * 2);
    }

    #[test]
    fn test_tone_stays_within_amplitude() {
        let audio = tone_for("hello", 8000);
        let peak = audio
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]).unsigned_abs())
            .max()
            .unwrap();
        assert!(peak as f64 <= TONE_AMPLITUDE.ceil());
        assert!(peak > 0);
    }

    #[tokio::test]
    async fn test_mock_respects_cancellation() {
        let options = SynthesizeOptions {
            sample_rate: 16000,
            cancel: CancellationToken::new(),
        };
        options.cancel.cancel();

        let result = MockTts.synthesize("hello", &options).await;
        assert!(matches!(result, Err(ProviderError::Cancelled(Stage::Synthesize))));
    }
}
