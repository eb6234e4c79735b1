//! Capability-provider traits
//!
//! The orchestrator only ever talks to these three interfaces:
//!
//! ```text
//!   SpeechToText:  linear PCM -> text
//!   LanguageModel: text -> text
//!   TextToSpeech:  text -> linear PCM
//! ```
//!
//! Every call carries its own `CancellationToken`. Implementations must stop
//! work promptly once the token fires and return `ProviderError::Cancelled`.
//! Empty text or empty audio is a valid result, not an error.

mod llm;
mod speech;

use std::sync::Arc;

pub use llm::{GenerateOptions, LanguageModel};
pub use speech::{SpeechToText, SynthesizeOptions, TextToSpeech, TranscribeOptions};

/// The three capabilities one session drives
#[derive(Clone)]
pub struct ProviderSet {
    pub stt: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("stt", &self.stt.name())
            .field("llm", &self.llm.name())
            .field("tts", &self.tts.name())
            .finish()
    }
}
