//! Real-time audio pipeline for telephony calls
//!
//! This crate provides the per-call core:
//! - law <-> linear PCM codec
//! - Linear-interpolation resampler
//! - RMS energy voice-activity signal
//! - Turn state machine
//! - Hysteresis utterance segmenter
//! - Session orchestrator (STT -> LLM -> TTS, barge-in, paced playback)

pub mod codec;
pub mod observer;
pub mod orchestrator;
pub mod resample;
pub mod segmenter;
pub mod turn;
pub mod vad;

pub use observer::TracingObserver;
pub use orchestrator::{SessionConfig, TurnOutcome, VoiceSession};
pub use resample::resample;
pub use segmenter::{SegmentEvent, Segmenter, SegmenterConfig, Utterance};
pub use turn::TurnStateMachine;
pub use vad::rms;

use thiserror::Error;
use voice_gateway_core::{ProviderError, Stage};

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} stage failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("{0} stage cancelled")]
    Cancelled(Stage),

    #[error("Session closed")]
    SessionClosed,
}

impl PipelineError {
    pub(crate) fn from_provider(stage: Stage, err: ProviderError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled(stage)
        } else {
            Self::Provider { stage, source: err }
        }
    }
}

impl From<PipelineError> for voice_gateway_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Provider { source, .. } => voice_gateway_core::Error::Provider(source),
            other => voice_gateway_core::Error::Audio(other.to_string()),
        }
    }
}
