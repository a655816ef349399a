//! Turn orchestration
//!
//! `Session` owns the conversation, the mood and the per-turn phase. It is the
//! only place that sequences capture, the tutor exchange and speech, so
//! recording and speaking can never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::driver::SessionEvent;
use super::lesson::LessonPlan;
use super::state::{CorrectionView, FeedbackView, Mood, Phase};
use crate::backend::TutorBackend;
use crate::correction::{self, CorrectionCase, Verdict};
use crate::history::{ConversationHistory, Turn};
use crate::phonetics::PhoneticDictionary;
use crate::voice::{AudioArtifact, CapturePipeline, Microphone, SpeechOutput, Utterance};
use crate::{Error, Result};

/// Fixed texts and timing for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Learner turn text when recognition heard nothing
    pub placeholder_text: String,
    /// Shown when the tutor service cannot be reached
    pub offline_notice: String,
    /// Shown while waiting for the first tap
    pub listening_notice: String,
    /// Slack past a clip's own length before the session moves on regardless
    ///
    /// Outputs that cannot report a length get exactly this long.
    pub playback_guard: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            placeholder_text: "I was talking!".to_string(),
            offline_notice: "My brain is offline! Check that the tutor service is running."
                .to_string(),
            listening_notice: "Tap the microphone and talk to me!".to_string(),
            playback_guard: Duration::from_secs(30),
        }
    }
}

/// One practice session
///
/// Nothing here outlives the value: dropping or [`end`](Self::end)ing the
/// session discards history, mood and any lesson progress.
pub struct Session<M: Microphone, B: TutorBackend, S: SpeechOutput> {
    id: Uuid,
    capture: CapturePipeline<M>,
    backend: B,
    speech: S,
    dictionary: Arc<PhoneticDictionary>,
    config: SessionConfig,
    history: ConversationHistory,
    phase: Phase,
    mood: Mood,
    feedback_text: String,
    correction: Option<CorrectionCase>,
    lesson: LessonPlan,
    /// Id of the most recent utterance; completions for older ones are stale
    utterance_seq: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
    view: watch::Sender<FeedbackView>,
}

impl<M: Microphone, B: TutorBackend, S: SpeechOutput> Session<M, B, S> {
    /// Create a session listening for its first tap
    ///
    /// Playback completions are delivered to `events`.
    pub fn new(
        microphone: M,
        backend: B,
        speech: S,
        dictionary: Arc<PhoneticDictionary>,
        config: SessionConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let feedback_text = config.listening_notice.clone();
        let (view, _) = watch::channel(FeedbackView {
            feedback_text: feedback_text.clone(),
            ..FeedbackView::default()
        });

        let id = Uuid::new_v4();
        tracing::info!(session = %id, backend = backend.name(), "session created");

        Self {
            id,
            capture: CapturePipeline::new(microphone),
            backend,
            speech,
            dictionary,
            config,
            history: ConversationHistory::new(),
            phase: Phase::ListeningForTap,
            mood: Mood::Happy,
            feedback_text,
            correction: None,
            lesson: LessonPlan::default(),
            utterance_seq: 0,
            events,
            view,
        }
    }

    /// Query voices and announce the session
    pub async fn start(&mut self) {
        if let Err(e) = self.speech.refresh_voices().await {
            tracing::warn!(error = %e, "voice catalog unavailable, using default voice");
        }
        if let Some(word) = self.lesson.current() {
            self.feedback_text = format!("Let's practice \"{}\"! Tap and say it.", word.word);
        }
        self.publish();
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn mood(&self) -> Mood {
        self.mood
    }

    #[must_use]
    pub fn feedback_text(&self) -> &str {
        &self.feedback_text
    }

    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Correction awaiting the learner's next attempt
    #[must_use]
    pub const fn correction(&self) -> Option<&CorrectionCase> {
        self.correction.as_ref()
    }

    #[must_use]
    pub const fn lesson(&self) -> &LessonPlan {
        &self.lesson
    }

    /// Replace the lesson plan
    pub fn set_lesson(&mut self, lesson: LessonPlan) {
        tracing::info!(
            words = lesson.remaining(),
            first = lesson.current().map_or("", |w| w.word.as_str()),
            "lesson set"
        );
        self.lesson = lesson;
        self.correction = None;
        self.publish();
    }

    /// Current feedback projection
    #[must_use]
    pub fn view(&self) -> FeedbackView {
        FeedbackView {
            phase: self.phase,
            mood: self.mood,
            is_recording: self.phase == Phase::Recording,
            is_thinking: matches!(self.phase, Phase::Thinking | Phase::Speaking),
            feedback_text: self.feedback_text.clone(),
            correction: self.correction.as_ref().map(CorrectionView::from),
            target_word: self.lesson.current().map(|w| w.word.clone()),
            history_len: self.history.len(),
        }
    }

    /// Follow feedback changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedbackView> {
        self.view.subscribe()
    }

    /// Begin recording
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCapturing` while recording or thinking,
    /// `PlaybackInProgress` while speaking, or `DeviceUnavailable` when the
    /// microphone cannot be acquired. The phase is unchanged in every case.
    pub fn start_capture(&mut self) -> Result<()> {
        match self.phase {
            Phase::Recording | Phase::Thinking => return Err(Error::AlreadyCapturing),
            Phase::Speaking => return Err(Error::PlaybackInProgress),
            Phase::ListeningForTap => {}
        }

        // A new attempt supersedes the previous correction
        self.correction = None;

        match self.capture.start_capture() {
            Ok(()) => {
                self.phase = Phase::Recording;
                self.publish();
                Ok(())
            }
            Err(e) => {
                if matches!(e, Error::DeviceUnavailable(_)) {
                    self.feedback_text = format!("I can't hear you yet: {e}");
                }
                self.publish();
                Err(e)
            }
        }
    }

    /// Finish recording and enter `Thinking`
    ///
    /// # Errors
    ///
    /// Returns `NotRecording` (phase unchanged) unless recording, or an audio
    /// error if the recording could not be assembled (back to listening)
    pub fn stop_capture(&mut self) -> Result<AudioArtifact> {
        if self.phase != Phase::Recording {
            return Err(Error::NotRecording);
        }

        match self.capture.stop_capture() {
            Ok(artifact) => {
                self.phase = Phase::Thinking;
                self.publish();
                Ok(artifact)
            }
            Err(e) => {
                self.phase = Phase::ListeningForTap;
                self.feedback_text = "Oops, I missed that. Tap to try again!".to_string();
                self.publish();
                Err(e)
            }
        }
    }

    /// Send a finished recording to the tutor and act on the answer
    ///
    /// On success both turns are appended (learner first), the mood follows
    /// the hint, the target word is checked and the reply is spoken. On
    /// failure the offline notice is shown and the session returns to
    /// listening with history and mood untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotRecording` if no turn is being resolved, or the
    /// `RemoteCallFailed` error after the session has recovered
    pub async fn resolve_turn(&mut self, artifact: AudioArtifact) -> Result<()> {
        if self.phase != Phase::Thinking {
            return Err(Error::NotRecording);
        }

        let reply = match self.backend.converse(&artifact, self.history.snapshot()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "tutor exchange failed");
                self.feedback_text.clone_from(&self.config.offline_notice);
                self.phase = Phase::ListeningForTap;
                self.publish();
                return Err(e);
            }
        };

        let learner_text = reply
            .transcription
            .clone()
            .unwrap_or_else(|| self.config.placeholder_text.clone());
        self.history.append(Turn::learner(learner_text));
        self.history.append(Turn::assistant(reply.reply_text.clone()));

        if let Some(mood) = reply.mood {
            self.mood = mood;
        }
        self.feedback_text.clone_from(&reply.reply_text);

        if let Some(heard) = reply.transcription.as_deref() {
            self.check_target(heard);
        }

        self.speak(Utterance::new(reply.reply_text, reply.mood)).await;
        Ok(())
    }

    fn check_target(&mut self, transcription: &str) {
        let Some(target) = self.lesson.current() else {
            return;
        };
        let Some(heard) = correction::heard_word(transcription, target, &self.dictionary) else {
            return;
        };

        match correction::evaluate(heard, target) {
            Verdict::Accepted => {
                self.lesson.advance();
            }
            Verdict::Correction(case) => {
                tracing::info!(
                    heard = %case.heard_word,
                    target = %case.target.word,
                    focus = ?case.focus_phonemes(),
                    "correction needed"
                );
                self.correction = Some(case);
            }
        }
    }

    /// Speak and watch for completion
    async fn speak(&mut self, utterance: Utterance) {
        self.utterance_seq += 1;
        let id = self.utterance_seq;
        self.phase = Phase::Speaking;
        self.publish();

        match self.speech.speak(utterance).await {
            Ok(handle) => {
                let events = self.events.clone();
                let guard = handle.length() + self.config.playback_guard;
                let cancel = handle.canceller();
                tokio::spawn(async move {
                    let timed_out = tokio::time::timeout(guard, handle.wait()).await.is_err();
                    if timed_out {
                        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
                    }
                    let _ = events.send(SessionEvent::PlaybackComplete {
                        utterance: id,
                        timed_out,
                    });
                });
            }
            Err(e) => {
                // Speech is a nicety: the reply is already on screen
                tracing::warn!(error = %e, "speech failed");
                self.phase = Phase::ListeningForTap;
                self.publish();
            }
        }
    }

    /// Playback of utterance `utterance` ended
    pub fn on_playback_complete(&mut self, utterance: u64, timed_out: bool) {
        if utterance != self.utterance_seq || self.phase != Phase::Speaking {
            tracing::debug!(utterance, current = self.utterance_seq, "stale playback completion");
            return;
        }
        if timed_out {
            tracing::warn!(utterance, "playback did not finish in time");
            self.speech.cancel();
        }
        self.phase = Phase::ListeningForTap;
        self.publish();
    }

    /// Say the target word of the current correction at normal pace
    ///
    /// # Errors
    ///
    /// Returns `NothingToReplay` without an active correction, or
    /// `PlaybackInProgress` unless listening for a tap
    pub async fn play_reference(&mut self) -> Result<()> {
        let word = self.replay_word()?;
        self.speak(Utterance::new(word, Some(Mood::Encouraging))).await;
        Ok(())
    }

    /// Say the target word of the current correction slowly
    ///
    /// # Errors
    ///
    /// Same as [`play_reference`](Self::play_reference)
    pub async fn play_slow(&mut self) -> Result<()> {
        let word = self.replay_word()?;
        self.speak(Utterance::new(word, Some(Mood::Encouraging)).slow())
            .await;
        Ok(())
    }

    fn replay_word(&self) -> Result<String> {
        let case = self.correction.as_ref().ok_or(Error::NothingToReplay)?;
        match self.phase {
            Phase::ListeningForTap => Ok(case.target.word.clone()),
            Phase::Speaking => Err(Error::PlaybackInProgress),
            Phase::Recording | Phase::Thinking => Err(Error::AlreadyCapturing),
        }
    }

    /// Microphone button: start or finish a turn depending on the phase
    pub async fn tap(&mut self) {
        match self.phase {
            Phase::ListeningForTap => {
                if let Err(e) = self.start_capture() {
                    tracing::warn!(error = %e, "could not start recording");
                }
            }
            Phase::Recording => match self.stop_capture() {
                Ok(artifact) => {
                    if let Err(e) = self.resolve_turn(artifact).await {
                        tracing::debug!(error = %e, "turn ended without a reply");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "could not finish recording"),
            },
            Phase::Thinking | Phase::Speaking => {
                tracing::debug!(phase = ?self.phase, "microphone disabled, tap ignored");
            }
        }
    }

    /// Apply one event; returns `false` when the session should end
    pub async fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Tap => self.tap().await,
            SessionEvent::Listen => {
                if let Err(e) = self.play_reference().await {
                    tracing::debug!(error = %e, "listen unavailable");
                }
            }
            SessionEvent::Slow => {
                if let Err(e) = self.play_slow().await {
                    tracing::debug!(error = %e, "slow mode unavailable");
                }
            }
            SessionEvent::PlaybackComplete {
                utterance,
                timed_out,
            } => self.on_playback_complete(utterance, timed_out),
            SessionEvent::Quit => return false,
        }
        true
    }

    /// Tear the session down, freeing the microphone and silencing speech
    pub fn end(mut self) {
        self.capture.abort();
        self.speech.cancel();
        tracing::info!(
            session = %self.id,
            turns = self.history.len(),
            mastered = self.lesson.completed().len(),
            "session ended"
        );
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }
}
