//! Voice Session Orchestrator
//!
//! One `VoiceSession` per caller connection. Inbound frames are handled
//! synchronously and in arrival order: decode, energy, barge-in check,
//! segmentation. Finalized utterances go onto an unbounded queue drained by a
//! single turn task, so at most one STT -> LLM -> TTS pipeline runs at a time
//! and turns complete in the order their utterances ended.
//!
//! Each provider call gets its own cancellation token, armed in the shared
//! session state for the duration of that stage. Stage tokens are children of
//! the session's close token, so closing the session aborts whatever is in
//! flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use voice_gateway_config::{AudioConfig, Settings};
use voice_gateway_core::{
    EventLevel, GenerateOptions, ObserverEvent, ProviderError, ProviderSet, SessionObserver,
    Stage, SynthesizeOptions, TranscribeOptions, TurnState,
};
use voice_gateway_transport::{
    parse_inbound, InboundMessage, MediaMessage, MediaSink, OutboundMessage, StartMessage,
    StopMessage,
};

use crate::segmenter::{SegmentEvent, Segmenter, SegmenterConfig, Utterance};
use crate::turn::TurnStateMachine;
use crate::{codec, resample, vad, PipelineError};

/// Per-session audio and provider parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Media stream format and endpointing thresholds
    pub audio: AudioConfig,
    /// Rate the transcription provider expects
    pub stt_sample_rate: u32,
    pub language_code: String,
    /// Rate requested from the synthesis provider
    pub tts_sample_rate: u32,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            audio: settings.audio.clone(),
            stt_sample_rate: settings.stt.sample_rate,
            language_code: settings.stt.language_code.clone(),
            tts_sample_rate: settings.tts.sample_rate,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Reply played to the end
    Completed { frames_sent: usize },
    /// Transcription produced no usable text
    EmptyTranscript,
    /// Generation produced no usable text
    EmptyResponse,
    /// Barge-in aborted the turn during the given stage
    Cancelled(Stage),
    /// The session closed mid-turn
    Closed,
}

#[derive(Debug, Default)]
struct StageTokens {
    transcribe: Option<CancellationToken>,
    generate: Option<CancellationToken>,
    synthesize: Option<CancellationToken>,
}

impl StageTokens {
    fn slot(&mut self, stage: Stage) -> &mut Option<CancellationToken> {
        match stage {
            Stage::Transcribe => &mut self.transcribe,
            Stage::Generate => &mut self.generate,
            Stage::Synthesize => &mut self.synthesize,
        }
    }

    fn abort_all(&mut self) {
        for token in [&self.transcribe, &self.generate, &self.synthesize]
            .into_iter()
            .flatten()
        {
            token.cancel();
        }
    }

    fn release_all(&mut self) {
        self.transcribe = None;
        self.generate = None;
        self.synthesize = None;
    }
}

/// State touched by both the frame path and the turn task.
///
/// Lock order: `machine` before `tokens`.
struct SessionShared {
    session_id: String,
    observer: Arc<dyn SessionObserver>,
    machine: Mutex<TurnStateMachine>,
    tokens: Mutex<StageTokens>,
    stream_id: Mutex<Option<String>>,
    closed: CancellationToken,
}

impl SessionShared {
    fn emit(&self, level: EventLevel, name: &'static str, payload: Option<Value>) {
        let mut event = ObserverEvent::new(self.session_id.clone(), level, name);
        event.payload = payload;
        self.observer.emit(event);
    }

    fn state(&self) -> TurnState {
        self.machine.lock().current()
    }

    fn transition(&self, next: TurnState) {
        self.machine.lock().transition(next);
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Enter `state` and arm a fresh token for `stage`.
    ///
    /// Both happen under the state lock so a barge-in either sees the old
    /// state or finds the new token.
    fn begin_stage(&self, stage: Stage, state: TurnState) -> Result<CancellationToken, PipelineError> {
        let mut machine = self.machine.lock();
        if self.is_closed() {
            return Err(PipelineError::SessionClosed);
        }
        machine.transition(state);

        let token = self.closed.child_token();
        *self.tokens.lock().slot(stage) = Some(token.clone());
        Ok(token)
    }

    fn end_stage(&self, stage: Stage) {
        self.tokens.lock().slot(stage).take();
    }

    fn finish_turn(&self) {
        let mut machine = self.machine.lock();
        self.tokens.lock().release_all();
        machine.transition(TurnState::Listening);
    }

    /// Abort the in-flight turn if the agent is speaking
    fn barge_in(&self) -> bool {
        let mut machine = self.machine.lock();
        if machine.current() != TurnState::Speaking {
            return false;
        }

        self.emit(EventLevel::Info, "barge-in", None);
        self.tokens.lock().abort_all();
        machine.transition(TurnState::Listening);
        true
    }
}

/// Per-connection orchestrator
pub struct VoiceSession {
    shared: Arc<SessionShared>,
    config: SessionConfig,
    segmenter: Segmenter,
    turn_tx: Option<mpsc::UnboundedSender<Utterance>>,
    worker: Option<JoinHandle<()>>,
    call_id: Option<String>,
}

impl VoiceSession {
    /// Create a session and spawn its turn task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        session_id: impl Into<String>,
        config: SessionConfig,
        providers: ProviderSet,
        sink: Arc<dyn MediaSink>,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let session_id = session_id.into();
        let shared = Arc::new(SessionShared {
            machine: Mutex::new(TurnStateMachine::new(session_id.clone(), observer.clone())),
            session_id,
            observer,
            tokens: Mutex::new(StageTokens::default()),
            stream_id: Mutex::new(None),
            closed: CancellationToken::new(),
        });

        shared.emit(
            EventLevel::Info,
            "session-start",
            Some(json!({
                "stt": providers.stt.name(),
                "llm": providers.llm.name(),
                "tts": providers.tts.name(),
            })),
        );

        let (turn_tx, turn_rx) = mpsc::unbounded_channel();
        let runner = TurnRunner {
            shared: shared.clone(),
            config: config.clone(),
            providers,
            sink,
        };
        let worker = tokio::spawn(runner.run(turn_rx));

        Self {
            segmenter: Segmenter::new(SegmenterConfig::from(&config.audio)),
            shared,
            config,
            turn_tx: Some(turn_tx),
            worker: Some(worker),
            call_id: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.shared.session_id
    }

    pub fn state(&self) -> TurnState {
        self.shared.state()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn stream_id(&self) -> Option<String> {
        self.shared.stream_id.lock().clone()
    }

    /// Frames held in the utterance currently being captured
    pub fn buffered_frames(&self) -> usize {
        self.segmenter.buffered_frames()
    }

    /// Handle one inbound transport message
    pub fn on_frame(&mut self, raw: &[u8]) {
        if self.is_closed() {
            return;
        }

        let message = match parse_inbound(raw) {
            Ok(message) => message,
            Err(err) => {
                let text = String::from_utf8_lossy(&raw[..raw.len().min(200)]);
                self.shared.emit(
                    EventLevel::Warn,
                    "malformed-event",
                    Some(json!({ "error": err.to_string(), "text": text })),
                );
                return;
            }
        };

        match message {
            InboundMessage::Start(start) => self.handle_start(start),
            InboundMessage::Media(media) => self.handle_media(media),
            InboundMessage::Stop(stop) => self.handle_stop(stop),
            InboundMessage::Unknown { event } => {
                self.shared
                    .emit(EventLevel::Warn, "unknown-event", Some(json!({ "event": event })));
            }
        }
    }

    fn handle_start(&mut self, start: StartMessage) {
        self.shared.emit(
            EventLevel::Info,
            "stream-start",
            Some(json!({ "callId": start.start.call_id, "streamId": start.start.stream_id })),
        );
        *self.shared.stream_id.lock() = Some(start.start.stream_id);
        self.call_id = Some(start.start.call_id);
    }

    fn handle_stop(&mut self, stop: StopMessage) {
        self.shared.emit(
            EventLevel::Info,
            "stream-stop",
            Some(json!({ "reason": stop.stop.reason })),
        );
        self.close();
    }

    fn handle_media(&mut self, media: MediaMessage) {
        if media.media.payload.is_empty() {
            return;
        }
        let law = match media.decode_payload() {
            Ok(law) => law,
            Err(err) => {
                self.shared.emit(
                    EventLevel::Warn,
                    "malformed-event",
                    Some(json!({ "error": err.to_string() })),
                );
                return;
            }
        };

        if let Some(stream_id) = media.stream_id {
            self.shared.stream_id.lock().get_or_insert(stream_id);
        }

        let pcm = codec::decode(&law);
        let energy = vad::rms(&pcm);

        // The interrupting frame is dropped, not reused as the next onset
        if energy >= self.config.audio.barge_in_threshold && self.shared.barge_in() {
            return;
        }

        match self.segmenter.push(&pcm, energy) {
            SegmentEvent::SpeechStarted => self.shared.transition(TurnState::Listening),
            SegmentEvent::Finalized(utterance) => self.enqueue(utterance),
            SegmentEvent::Captured | SegmentEvent::Discarded => {}
        }
    }

    fn enqueue(&self, utterance: Utterance) {
        let Some(tx) = &self.turn_tx else {
            return;
        };
        tracing::debug!(
            session_id = %self.shared.session_id,
            frames = utterance.frames,
            bytes = utterance.pcm.len(),
            "Utterance finalized"
        );
        if tx.send(utterance).is_err() {
            tracing::debug!(session_id = %self.shared.session_id, "Turn task gone, utterance dropped");
        }
    }

    /// Tear the session down. Aborts live provider calls and playback;
    /// queued utterances are dropped. Idempotent.
    pub fn close(&mut self) {
        if self.shared.is_closed() {
            return;
        }
        self.shared.closed.cancel();
        self.turn_tx.take();
        self.shared.emit(
            EventLevel::Info,
            "session-end",
            Some(json!({ "callId": self.call_id })),
        );
    }

    /// Stop accepting utterances and wait for queued turns to finish
    pub async fn drain(&mut self) {
        self.turn_tx.take();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(session_id = %self.shared.session_id, error = %e, "Turn task ended abnormally");
            }
        }
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drains the utterance queue, one turn at a time
struct TurnRunner {
    shared: Arc<SessionShared>,
    config: SessionConfig,
    providers: ProviderSet,
    sink: Arc<dyn MediaSink>,
}

impl TurnRunner {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Utterance>) {
        loop {
            let utterance = tokio::select! {
                biased;
                _ = self.shared.closed.cancelled() => break,
                next = rx.recv() => match next {
                    Some(utterance) => utterance,
                    None => break,
                },
            };

            match self.run_turn(utterance).await {
                Ok(outcome) => {
                    tracing::debug!(session_id = %self.shared.session_id, ?outcome, "Turn finished");
                }
                Err(err) => {
                    self.shared.emit(
                        EventLevel::Error,
                        "utterance-failure",
                        Some(json!({ "error": err.to_string() })),
                    );
                }
            }
        }
    }

    async fn run_turn(&self, utterance: Utterance) -> Result<TurnOutcome, PipelineError> {
        let result = self.run_stages(utterance).await;
        self.shared.finish_turn();

        match result {
            Err(_) if self.shared.is_closed() => Ok(TurnOutcome::Closed),
            Err(PipelineError::Cancelled(stage)) => {
                self.shared.emit(
                    EventLevel::Info,
                    "turn-cancelled",
                    Some(json!({ "stage": stage.as_str() })),
                );
                Ok(TurnOutcome::Cancelled(stage))
            }
            other => other,
        }
    }

    async fn run_stages(&self, utterance: Utterance) -> Result<TurnOutcome, PipelineError> {
        let inbound_rate = self.config.audio.sample_rate;

        // Speech-to-text
        let token = self.shared.begin_stage(Stage::Transcribe, TurnState::Transcribing)?;
        let started = Instant::now();
        let transcript = {
            let audio = resample(&utterance.pcm, inbound_rate, self.config.stt_sample_rate);
            let options = TranscribeOptions {
                sample_rate: self.config.stt_sample_rate,
                language_code: self.config.language_code.clone(),
                cancel: token.clone(),
            };
            guarded(Stage::Transcribe, &token, self.providers.stt.transcribe(&audio, &options)).await?
        };
        self.shared.end_stage(Stage::Transcribe);
        drop(utterance);
        tracing::debug!(
            session_id = %self.shared.session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transcription complete"
        );

        if transcript.trim().is_empty() {
            self.shared.emit(EventLevel::Warn, "empty-transcript", None);
            return Ok(TurnOutcome::EmptyTranscript);
        }

        // Response generation
        let token = self.shared.begin_stage(Stage::Generate, TurnState::Thinking)?;
        let started = Instant::now();
        let options = GenerateOptions { cancel: token.clone() };
        let response =
            guarded(Stage::Generate, &token, self.providers.llm.generate(&transcript, &options)).await?;
        self.shared.end_stage(Stage::Generate);

        if response.trim().is_empty() {
            self.shared.emit(
                EventLevel::Warn,
                "empty-response",
                Some(json!({ "transcript": transcript })),
            );
            return Ok(TurnOutcome::EmptyResponse);
        }
        self.shared.emit(
            EventLevel::Info,
            "llm-response",
            Some(json!({
                "length": response.len(),
                "elapsed_ms": started.elapsed().as_millis() as u64,
            })),
        );

        // Synthesis and playback; the token stays armed until the turn ends
        let token = self.shared.begin_stage(Stage::Synthesize, TurnState::Speaking)?;
        let options = SynthesizeOptions {
            sample_rate: self.config.tts_sample_rate,
            cancel: token.clone(),
        };
        let audio =
            guarded(Stage::Synthesize, &token, self.providers.tts.synthesize(&response, &options)).await?;

        let frames_sent = self.play(&audio, &token).await?;
        Ok(TurnOutcome::Completed { frames_sent })
    }

    /// Emit synthesized PCM as law frames, one per frame interval
    async fn play(&self, pcm: &[u8], token: &CancellationToken) -> Result<usize, PipelineError> {
        if pcm.is_empty() {
            return Ok(0);
        }

        let audio = &self.config.audio;
        let frame_bytes = audio.frame_bytes();
        let frame_duration = audio.frame_duration();
        let normalized = resample(pcm, self.config.tts_sample_rate, audio.sample_rate);
        let padded = pad_to_frames(&normalized, frame_bytes);
        let stream_id = self.shared.stream_id.lock().clone();

        let mut sent = 0;
        for chunk in padded.chunks(frame_bytes) {
            if self.shared.is_closed() {
                return Err(PipelineError::SessionClosed);
            }
            if token.is_cancelled() {
                return Err(PipelineError::Cancelled(Stage::Synthesize));
            }

            let message = OutboundMessage::media(stream_id.clone(), &codec::encode(chunk));
            if let Err(e) = self.sink.send(message).await {
                tracing::debug!(session_id = %self.shared.session_id, error = %e, "Outbound frame dropped");
            }
            sent += 1;

            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(frame_duration) => {}
            }
        }

        Ok(sent)
    }
}

/// Race a provider call against its stage token
async fn guarded<T, F>(stage: Stage, token: &CancellationToken, call: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Cancelled(stage)),
        result = call => result.map_err(|e| PipelineError::from_provider(stage, e)),
    }
}

/// Zero-fill `pcm` up to a whole number of frames
fn pad_to_frames(pcm: &[u8], frame_bytes: usize) -> Vec<u8> {
    let frames = pcm.len().div_ceil(frame_bytes);
    let mut padded = vec![0u8; frames * frame_bytes];
    padded[..pcm.len()].copy_from_slice(pcm);
    padded
}
