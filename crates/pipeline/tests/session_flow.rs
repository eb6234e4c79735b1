//! Integration tests for the per-call session (frames -> STT -> LLM -> TTS -> frames)
//!
//! Providers and the outbound sink are in-memory stubs; time is paused so
//! playback pacing is observable without real sleeps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::Mutex;
use serde_json::json;
use tokio::time::Instant;

use voice_gateway_core::{
    CancellationToken, GenerateOptions, LanguageModel, ObserverEvent, ProviderError, ProviderSet,
    SessionObserver, SpeechToText, Stage, SynthesizeOptions, TextToSpeech, TranscribeOptions,
    TurnState,
};
use voice_gateway_pipeline::{codec, SessionConfig, VoiceSession};
use voice_gateway_transport::{MediaSink, OutboundMessage, TransportError};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ObserverEvent>>,
}

impl Recorder {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.name).collect()
    }

    fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name == name).count()
    }

    /// Target states of every reported transition, in order
    fn transitions(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.name == "state-transition")
            .filter_map(|e| e.payload.as_ref()?["to"].as_str().map(str::to_string))
            .collect()
    }
}

impl SessionObserver for Recorder {
    fn emit(&self, event: ObserverEvent) {
        self.events.lock().push(event);
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(Instant, OutboundMessage)>>,
}

impl RecordingSink {
    fn len(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl MediaSink for RecordingSink {
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.sent.lock().push((Instant::now(), message));
        Ok(())
    }
}

struct StubStt {
    /// Returned in order; the last entry repeats
    results: Mutex<Vec<Result<String, ProviderError>>>,
    audio_lengths: Mutex<Vec<usize>>,
}

impl StubStt {
    fn saying(text: &str) -> Self {
        Self::scripted(vec![Ok(text.to_string())])
    }

    fn scripted(results: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results),
            audio_lengths: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechToText for StubStt {
    async fn transcribe(
        &self,
        audio: &[u8],
        _options: &TranscribeOptions,
    ) -> Result<String, ProviderError> {
        self.audio_lengths.lock().push(audio.len());
        let mut results = self.results.lock();
        if results.len() > 1 {
            results.remove(0)
        } else {
            match &results[0] {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(ProviderError::Http { provider: "stub", status: 500 }),
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct StubLlm {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LanguageModel for StubLlm {
    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct StubTts {
    audio: Vec<u8>,
    /// Block until cancelled instead of returning audio
    hang: bool,
    calls: AtomicUsize,
    tokens: Mutex<Vec<CancellationToken>>,
}

impl StubTts {
    /// `frames` frames of 16 kHz audio, 20 ms each
    fn frames(frames: usize) -> Self {
        let pcm = tone(3000, frames * 320);
        Self {
            audio: pcm,
            hang: false,
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
        }
    }

    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::frames(1)
        }
    }
}

#[async_trait]
impl TextToSpeech for StubTts {
    async fn synthesize(&self, _text: &str, options: &SynthesizeOptions) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(options.cancel.clone());
        if self.hang {
            options.cancel.cancelled().await;
            return Err(ProviderError::Cancelled(Stage::Synthesize));
        }
        Ok(self.audio.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    stt: Arc<StubStt>,
    llm: Arc<StubLlm>,
    tts: Arc<StubTts>,
    sink: Arc<RecordingSink>,
    observer: Arc<Recorder>,
}

impl Harness {
    fn new(stt: StubStt, llm: StubLlm, tts: StubTts) -> Self {
        Self {
            stt: Arc::new(stt),
            llm: Arc::new(llm),
            tts: Arc::new(tts),
            sink: Arc::new(RecordingSink::default()),
            observer: Arc::new(Recorder::default()),
        }
    }

    fn standard() -> Self {
        Self::new(StubStt::saying("hello"), StubLlm::replying("hi there"), StubTts::frames(2))
    }

    fn session(&self) -> VoiceSession {
        let providers = ProviderSet {
            stt: self.stt.clone(),
            llm: self.llm.clone(),
            tts: self.tts.clone(),
        };
        VoiceSession::new(
            "test-session",
            SessionConfig::default(),
            providers,
            self.sink.clone(),
            self.observer.clone(),
        )
    }
}

/// Constant-amplitude 16-bit PCM
fn tone(amplitude: i16, samples: usize) -> Vec<u8> {
    std::iter::repeat(amplitude)
        .take(samples)
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

/// One 20 ms inbound media message at 8 kHz
fn media_frame(amplitude: i16) -> Vec<u8> {
    let law = codec::encode(&tone(amplitude, 160));
    json!({ "event": "media", "media": { "payload": BASE64.encode(law) } })
        .to_string()
        .into_bytes()
}

fn speech() -> Vec<u8> {
    media_frame(1000)
}

fn silence() -> Vec<u8> {
    media_frame(0)
}

fn start_frame() -> Vec<u8> {
    json!({ "event": "start", "start": { "callSid": "CA123", "streamSid": "MZ456" } })
        .to_string()
        .into_bytes()
}

/// Feed one complete utterance: `loud` speech frames then a full silence run
fn speak(session: &mut VoiceSession, loud: usize) {
    for _ in 0..loud {
        session.on_frame(&speech());
    }
    for _ in 0..8 {
        session.on_frame(&silence());
    }
}

async fn wait_for_state(session: &VoiceSession, state: TurnState) {
    for _ in 0..100 {
        if session.state() == state {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("session never reached {state}, stuck in {}", session.state());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Three speech frames then eight quiet ones close the utterance on frame 11
#[tokio::test(start_paused = true)]
async fn test_utterance_finalizes_after_silence_run() {
    let harness = Harness::standard();
    let mut session = harness.session();
    assert_eq!(session.state(), TurnState::Connected);

    for _ in 0..3 {
        session.on_frame(&speech());
    }
    assert_eq!(session.state(), TurnState::Listening);
    assert_eq!(session.buffered_frames(), 3);

    for _ in 0..7 {
        session.on_frame(&silence());
    }
    assert_eq!(session.buffered_frames(), 10);

    session.on_frame(&silence());
    assert_eq!(session.buffered_frames(), 0);

    // Only the opening Connected -> Listening so far
    assert_eq!(harness.observer.transitions(), vec!["LISTENING"]);

    session.drain().await;

    // 11 frames of 160 samples, upsampled 8k -> 16k
    assert_eq!(*harness.stt.audio_lengths.lock(), vec![11 * 640]);
    assert_eq!(*harness.llm.prompts.lock(), vec!["hello".to_string()]);
}

/// Quiet frames before any speech are dropped without touching state
#[tokio::test(start_paused = true)]
async fn test_leading_silence_is_discarded() {
    let harness = Harness::standard();
    let mut session = harness.session();

    for _ in 0..20 {
        session.on_frame(&silence());
    }

    assert_eq!(session.state(), TurnState::Connected);
    assert_eq!(session.buffered_frames(), 0);
    session.drain().await;
    assert!(harness.stt.audio_lengths.lock().is_empty());
}

/// Full turn: 500 ms of inbound audio produces two paced outbound frames
#[tokio::test(start_paused = true)]
async fn test_end_to_end_turn() {
    let harness = Harness::standard();
    let mut session = harness.session();

    session.on_frame(&start_frame());
    assert_eq!(session.call_id(), Some("CA123"));

    for _ in 0..10 {
        session.on_frame(&speech());
    }
    for _ in 0..15 {
        session.on_frame(&silence());
    }

    session.drain().await;

    let sent = harness.sink.sent.lock();
    assert_eq!(sent.len(), 2);
    for (_, message) in sent.iter() {
        assert_eq!(message.law_payload().unwrap().len(), 160);
        let OutboundMessage::Media { stream_id, .. } = message;
        assert_eq!(stream_id.as_deref(), Some("MZ456"));
    }
    assert_eq!(sent[1].0 - sent[0].0, Duration::from_millis(20));

    assert_eq!(session.state(), TurnState::Listening);
    assert_eq!(
        harness.observer.transitions(),
        vec!["LISTENING", "TRANSCRIBING", "THINKING", "SPEAKING", "LISTENING"]
    );
    assert_eq!(harness.observer.count("llm-response"), 1);
    assert_eq!(harness.observer.count("utterance-failure"), 0);
}

/// Loud audio while the agent speaks aborts synthesis and drops the frame
#[tokio::test(start_paused = true)]
async fn test_barge_in_cancels_synthesis() {
    let harness = Harness::new(
        StubStt::saying("tell me a story"),
        StubLlm::replying("once upon a time"),
        StubTts::hanging(),
    );
    let mut session = harness.session();

    speak(&mut session, 3);
    wait_for_state(&session, TurnState::Speaking).await;

    session.on_frame(&media_frame(5000));

    assert_eq!(session.state(), TurnState::Listening);
    assert_eq!(session.buffered_frames(), 0);
    assert_eq!(harness.observer.count("barge-in"), 1);
    assert!(harness.tts.tokens.lock()[0].is_cancelled());

    session.drain().await;

    assert_eq!(harness.sink.len(), 0);
    let cancelled = harness
        .observer
        .events
        .lock()
        .iter()
        .find(|e| e.name == "turn-cancelled")
        .and_then(|e| e.payload.clone())
        .expect("turn-cancelled event");
    assert_eq!(cancelled["stage"], "tts");
    assert_eq!(harness.observer.count("utterance-failure"), 0);
}

/// Loud audio outside Speaking is ordinary speech
#[tokio::test(start_paused = true)]
async fn test_loud_frame_while_listening_is_not_barge_in() {
    let harness = Harness::standard();
    let mut session = harness.session();

    session.on_frame(&media_frame(5000));

    assert_eq!(harness.observer.count("barge-in"), 0);
    assert_eq!(session.buffered_frames(), 1);
    assert_eq!(session.state(), TurnState::Listening);
}

/// A blank transcript ends the turn before generation
#[tokio::test(start_paused = true)]
async fn test_empty_transcript_skips_generation() {
    let harness = Harness::new(StubStt::saying("   "), StubLlm::replying("unused"), StubTts::frames(2));
    let mut session = harness.session();

    speak(&mut session, 3);
    session.drain().await;

    assert_eq!(harness.observer.count("empty-transcript"), 1);
    assert!(harness.llm.prompts.lock().is_empty());
    assert_eq!(harness.tts.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.sink.len(), 0);
    assert_eq!(session.state(), TurnState::Listening);
}

/// A blank reply ends the turn before synthesis
#[tokio::test(start_paused = true)]
async fn test_empty_response_skips_synthesis() {
    let harness = Harness::new(StubStt::saying("hello"), StubLlm::replying(""), StubTts::frames(2));
    let mut session = harness.session();

    speak(&mut session, 3);
    session.drain().await;

    assert_eq!(harness.observer.count("empty-response"), 1);
    assert_eq!(harness.tts.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.state(), TurnState::Listening);
}

/// A failed turn is reported and the next utterance still runs
#[tokio::test(start_paused = true)]
async fn test_provider_failure_does_not_stop_later_turns() {
    let harness = Harness::new(
        StubStt::scripted(vec![
            Err(ProviderError::Http { provider: "stub", status: 503 }),
            Ok("second try".to_string()),
        ]),
        StubLlm::replying("got it"),
        StubTts::frames(2),
    );
    let mut session = harness.session();

    speak(&mut session, 3);
    speak(&mut session, 4);
    session.drain().await;

    assert_eq!(harness.observer.count("utterance-failure"), 1);
    assert_eq!(*harness.stt.audio_lengths.lock(), vec![11 * 640, 12 * 640]);
    assert_eq!(*harness.llm.prompts.lock(), vec!["second try".to_string()]);
    assert_eq!(harness.sink.len(), 2);
    assert_eq!(session.state(), TurnState::Listening);
}

/// Closing mid-playback stops the outbound stream
#[tokio::test(start_paused = true)]
async fn test_close_stops_playback() {
    let harness = Harness::new(StubStt::saying("hello"), StubLlm::replying("a long answer"), StubTts::frames(50));
    let mut session = harness.session();

    speak(&mut session, 3);
    wait_for_state(&session, TurnState::Speaking).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    session.close();
    let sent_at_close = harness.sink.len();
    session.drain().await;

    assert!(sent_at_close > 0);
    assert!(sent_at_close < 50);
    assert_eq!(harness.sink.len(), sent_at_close);
    assert!(session.is_closed());
    assert_eq!(harness.observer.count("utterance-failure"), 0);
}

/// Barge-in while frames are going out drops the rest of the reply
#[tokio::test(start_paused = true)]
async fn test_barge_in_during_playback_stops_frames() {
    let harness = Harness::new(StubStt::saying("hello"), StubLlm::replying("a long answer"), StubTts::frames(50));
    let mut session = harness.session();

    speak(&mut session, 3);
    wait_for_state(&session, TurnState::Speaking).await;
    tokio::time::sleep(Duration::from_millis(70)).await;

    let sent_before = harness.sink.len();
    assert!(sent_before > 0);

    session.on_frame(&media_frame(5000));
    assert_eq!(session.state(), TurnState::Listening);
    assert_eq!(harness.observer.count("barge-in"), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.sink.len(), sent_before);

    session.drain().await;

    assert_eq!(harness.sink.len(), sent_before);
    assert!(!session.is_closed());
    assert_eq!(harness.observer.count("turn-cancelled"), 1);
    let cancelled = harness
        .observer
        .events
        .lock()
        .iter()
        .find(|e| e.name == "turn-cancelled")
        .and_then(|e| e.payload.clone())
        .expect("turn-cancelled event");
    assert_eq!(cancelled["stage"], "tts");
    assert_eq!(harness.observer.count("utterance-failure"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_and_unknown_events_are_ignored() {
    let harness = Harness::standard();
    let mut session = harness.session();

    session.on_frame(b"not json at all");
    session.on_frame(br#"{"event":"mark","mark":{"name":"x"}}"#);
    session.on_frame(br#"{"event":"media","media":{"payload":"!!!"}}"#);

    assert_eq!(harness.observer.count("malformed-event"), 2);
    assert_eq!(harness.observer.count("unknown-event"), 1);
    assert!(!session.is_closed());
    assert_eq!(session.state(), TurnState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_stop_closes_session_once() {
    let harness = Harness::standard();
    let mut session = harness.session();

    session.on_frame(&start_frame());
    session.on_frame(br#"{"event":"stop","stop":{"reason":"hangup"}}"#);
    assert!(session.is_closed());

    // Frames after close are ignored
    session.on_frame(&speech());
    assert_eq!(session.buffered_frames(), 0);

    session.close();
    drop(session);

    assert_eq!(
        harness.observer.names(),
        vec!["session-start", "stream-start", "stream-stop", "session-end"]
    );
    let end = harness.observer.events.lock()[3].payload.clone().unwrap();
    assert_eq!(end["callId"], "CA123");
}
