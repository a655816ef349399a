//! Shared test utilities: fakes for the hardware and network seams

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lingo_pal::voice::{
    AudioArtifact, ChunkSink, Microphone, PlaybackHandle, PlaybackSignal, SAMPLE_RATE,
    SpeechOutput, Utterance,
};
use lingo_pal::{
    Error, LessonPlan, Mood, PhoneticDictionary, Result, Session, SessionConfig, SessionEvent,
    Turn, TutorBackend, TutorReply,
};

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Microphone that delivers canned chunks, or refuses access
#[derive(Clone, Default)]
pub struct FakeMic {
    pub deny: Arc<AtomicBool>,
    pub held: Arc<AtomicBool>,
}

impl Microphone for FakeMic {
    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn acquire(&mut self, sink: ChunkSink) -> Result<()> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable("permission denied".to_string()));
        }
        self.held.store(true, Ordering::SeqCst);
        let samples = generate_sine_samples(440.0, 0.2, 0.5);
        for chunk in samples.chunks(800) {
            sink.push(chunk);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

/// Tutor that answers from a script
#[derive(Clone, Default)]
pub struct ScriptedTutor {
    replies: Arc<Mutex<VecDeque<Option<TutorReply>>>>,
    /// History length seen by each call
    pub seen_history: Arc<Mutex<Vec<Vec<Turn>>>>,
    /// How long each call takes to answer
    pub latency: Arc<Mutex<Duration>>,
}

impl ScriptedTutor {
    pub fn reply(&self, transcription: Option<&str>, text: &str, mood: Option<Mood>) -> &Self {
        self.replies.lock().unwrap().push_back(Some(TutorReply {
            transcription: transcription.map(ToString::to_string),
            reply_text: text.to_string(),
            mood,
        }));
        self
    }

    pub fn fail(&self) -> &Self {
        self.replies.lock().unwrap().push_back(None);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen_history.lock().unwrap().len()
    }
}

#[async_trait]
impl TutorBackend for ScriptedTutor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn converse(&self, audio: &AudioArtifact, history: &[Turn]) -> Result<TutorReply> {
        assert!(!audio.bytes.is_empty(), "artifact must carry a WAV container");
        self.seen_history.lock().unwrap().push(history.to_vec());
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            Some(None) => Err(Error::remote_retryable("connection refused")),
            None => Err(Error::remote_fatal("script exhausted")),
        }
    }
}

/// Speech output that records utterances
///
/// With `hold` set, playback never finishes on its own.
#[derive(Clone, Default)]
pub struct RecordingSpeech {
    pub spoken: Arc<Mutex<Vec<Utterance>>>,
    pub hold: Arc<AtomicBool>,
    pub fail: Arc<AtomicBool>,
    pub cancels: Arc<Mutex<usize>>,
    /// Length reported for held clips
    pub clip_length: Arc<Mutex<Duration>>,
    pending: Arc<Mutex<Vec<PlaybackSignal>>>,
}

impl RecordingSpeech {
    pub fn texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn speak(&mut self, utterance: Utterance) -> Result<PlaybackHandle> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Tts("synthesis failed".to_string()));
        }
        self.spoken.lock().unwrap().push(utterance);
        if self.hold.load(Ordering::SeqCst) {
            let (signal, handle) = PlaybackHandle::channel();
            self.pending.lock().unwrap().push(signal);
            Ok(handle.with_length(*self.clip_length.lock().unwrap()))
        } else {
            Ok(PlaybackHandle::finished())
        }
    }

    fn cancel(&mut self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

pub type TestSession = Session<FakeMic, ScriptedTutor, RecordingSpeech>;

/// Everything a session test needs to drive and inspect a session
pub struct Harness {
    pub session: TestSession,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Input side of the session's event channel
    pub sender: mpsc::UnboundedSender<SessionEvent>,
    pub mic: FakeMic,
    pub tutor: ScriptedTutor,
    pub speech: RecordingSpeech,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let mic = FakeMic::default();
        let tutor = ScriptedTutor::default();
        let speech = RecordingSpeech::default();
        let (tx, events) = mpsc::unbounded_channel();
        let session = Session::new(
            mic.clone(),
            tutor.clone(),
            speech.clone(),
            Arc::new(PhoneticDictionary::builtin().clone()),
            config,
            tx.clone(),
        );
        Self {
            session,
            events,
            sender: tx,
            mic,
            tutor,
            speech,
        }
    }

    pub fn with_lesson(mut self, words: &[&str]) -> Self {
        let lesson = LessonPlan::from_words(PhoneticDictionary::builtin(), words).unwrap();
        self.session.set_lesson(lesson);
        self
    }

    /// Record, send and speak one full turn, then deliver playback completion
    pub async fn full_turn(&mut self) {
        self.session.tap().await;
        self.session.tap().await;
        self.finish_playback().await;
    }

    /// Wait for the next playback completion and hand it to the session
    pub async fn finish_playback(&mut self) {
        let event = tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("playback completion should arrive")
            .expect("event channel open");
        assert!(matches!(event, SessionEvent::PlaybackComplete { .. }));
        assert!(self.session.handle(event).await);
    }
}
