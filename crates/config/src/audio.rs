//! Telephony audio and endpointing configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Inbound/outbound media stream format and detector thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of the media stream in Hz (both directions)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Duration of one media frame in milliseconds
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,

    /// RMS energy at or above which a frame counts as speech
    #[serde(default = "default_vad_threshold")]
    pub vad_threshold: f64,

    /// Consecutive below-threshold frames that end an utterance
    #[serde(default = "default_silence_frames")]
    pub silence_frames: u32,

    /// RMS energy at or above which caller audio interrupts playback
    #[serde(default = "default_barge_in_threshold")]
    pub barge_in_threshold: f64,
}

fn default_sample_rate() -> u32 {
    8000
}
fn default_frame_ms() -> u32 {
    20
}
fn default_vad_threshold() -> f64 {
    200.0
}
fn default_silence_frames() -> u32 {
    8
}
fn default_barge_in_threshold() -> f64 {
    220.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            frame_ms: default_frame_ms(),
            vad_threshold: default_vad_threshold(),
            silence_frames: default_silence_frames(),
            barge_in_threshold: default_barge_in_threshold(),
        }
    }
}

impl AudioConfig {
    /// Samples in one frame, rounded to the nearest sample
    pub fn frame_samples(&self) -> usize {
        ((self.sample_rate as f64 * self.frame_ms as f64) / 1000.0).round() as usize
    }

    /// Bytes in one 16-bit linear PCM frame
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() * 2
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("audio.sample_rate", "must be positive"));
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::invalid("audio.frame_ms", "must be positive"));
        }
        if self.frame_samples() == 0 {
            return Err(ConfigError::invalid(
                "audio.frame_ms",
                "frame is shorter than one sample",
            ));
        }
        if self.silence_frames == 0 {
            return Err(ConfigError::invalid("audio.silence_frames", "must be at least 1"));
        }
        if !(self.vad_threshold >= 0.0) || !(self.barge_in_threshold >= 0.0) {
            return Err(ConfigError::invalid(
                "audio.vad_threshold",
                "energy thresholds must be non-negative numbers",
            ));
        }
        if self.barge_in_threshold < self.vad_threshold {
            tracing::warn!(
                vad = self.vad_threshold,
                barge_in = self.barge_in_threshold,
                "Barge-in threshold is below the voice-activity threshold"
            );
        }
        Ok(())
    }
}
