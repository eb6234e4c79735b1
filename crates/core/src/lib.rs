//! Core traits and types for the voice gateway
//!
//! This crate provides foundational types used across all other crates:
//! - Error types
//! - Turn states shared by the state machine and observers
//! - The session observer interface
//! - Capability-provider traits (STT, LLM, TTS)

pub mod error;
pub mod observer;
pub mod state;
pub mod traits;

pub use error::{Error, ProviderError, Result, Stage};
pub use observer::{EventLevel, NullObserver, ObserverEvent, SessionObserver};
pub use state::TurnState;
pub use traits::{
    GenerateOptions, LanguageModel, ProviderSet, SpeechToText, SynthesizeOptions, TextToSpeech,
    TranscribeOptions,
};

// Re-exported so providers and the orchestrator agree on one token type.
pub use tokio_util::sync::CancellationToken;
