//! Utterance segmentation
//!
//! Two-threshold hysteresis endpointing. A frame at or above the
//! voice-activity threshold opens (or extends) an utterance; while open,
//! quieter frames are still captured and counted, and the utterance closes
//! after `silence_frames` consecutive quiet frames. Quiet frames outside an
//! utterance are dropped.
//!
//! Purely synchronous: the caller supplies the decoded frame and its energy
//! and acts on the returned event.

use voice_gateway_config::AudioConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmenterConfig {
    pub vad_threshold: f64,
    pub silence_frames: u32,
}

impl From<&AudioConfig> for SegmenterConfig {
    fn from(audio: &AudioConfig) -> Self {
        Self {
            vad_threshold: audio.vad_threshold,
            silence_frames: audio.silence_frames,
        }
    }
}

/// One captured span of caller speech, as concatenated linear PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub pcm: Vec<u8>,
    pub frames: usize,
}

/// What the segmenter did with a frame
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEvent {
    /// Quiet frame outside an utterance
    Discarded,
    /// First speech frame of a new utterance (buffered)
    SpeechStarted,
    /// Frame appended to the open utterance
    Captured,
    /// Frame appended and the utterance closed
    Finalized(Utterance),
}

#[derive(Debug)]
pub struct Segmenter {
    config: SegmenterConfig,
    buffer: Vec<u8>,
    frames: usize,
    speaking: bool,
    silence_count: u32,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            frames: 0,
            speaking: false,
            silence_count: 0,
        }
    }

    pub fn push(&mut self, frame: &[u8], energy: f64) -> SegmentEvent {
        if energy >= self.config.vad_threshold {
            self.append(frame);
            self.silence_count = 0;
            if !self.speaking {
                self.speaking = true;
                return SegmentEvent::SpeechStarted;
            }
            return SegmentEvent::Captured;
        }

        if !self.speaking {
            return SegmentEvent::Discarded;
        }

        self.append(frame);
        self.silence_count += 1;
        if self.silence_count < self.config.silence_frames {
            return SegmentEvent::Captured;
        }

        self.speaking = false;
        self.silence_count = 0;
        let frames = std::mem::take(&mut self.frames);
        let pcm = std::mem::take(&mut self.buffer);
        if pcm.is_empty() {
            return SegmentEvent::Discarded;
        }
        SegmentEvent::Finalized(Utterance { pcm, frames })
    }

    /// Whether an utterance is currently open
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Frames buffered in the open utterance
    pub fn buffered_frames(&self) -> usize {
        self.frames
    }

    fn append(&mut self, frame: &[u8]) {
        self.buffer.extend_from_slice(frame);
        self.frames += 1;
    }
}
