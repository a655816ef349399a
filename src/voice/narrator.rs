//! Spoken replies for young listeners
//!
//! Wraps TTS and playback behind [`SpeechOutput`]: text is softened for
//! natural cadence, a friendly voice is preferred when the provider offers
//! one, and every clip plays slightly slower and higher than normal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, PlaybackHandle, decode_mp3, resample};
use super::tts::{SpeechRequest, Synthesizer, TextToSpeech, VoiceInfo};
use crate::session::Mood;
use crate::{Error, Result};

/// Delivery speed of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pace {
    #[default]
    Normal,
    /// Exaggerated slow delivery for modelling a word
    Slow,
}

/// Something the assistant should say
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub mood: Option<Mood>,
    pub pace: Pace,
}

impl Utterance {
    pub fn new(text: impl Into<String>, mood: Option<Mood>) -> Self {
        Self {
            text: text.into(),
            mood,
            pace: Pace::Normal,
        }
    }

    #[must_use]
    pub const fn slow(mut self) -> Self {
        self.pace = Pace::Slow;
        self
    }
}

/// Fixed delivery tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceProfile {
    /// Speaking rate, below 1.0 for comprehension
    pub rate: f32,
    /// Pitch multiplier, above 1.0 for a playful voice
    pub pitch: f32,
    /// Rate used for [`Pace::Slow`]
    pub slow_rate: f32,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.2,
            slow_rate: 0.6,
        }
    }
}

impl VoiceProfile {
    /// Rate for a given pace
    #[must_use]
    pub const fn rate_for(&self, pace: Pace) -> f32 {
        match pace {
            Pace::Normal => self.rate,
            Pace::Slow => self.slow_rate,
        }
    }
}

/// Destination for the assistant's speech
#[async_trait]
pub trait SpeechOutput: Send {
    /// Re-query the available voices
    ///
    /// # Errors
    ///
    /// Returns error if the voice catalog cannot be fetched
    async fn refresh_voices(&mut self) -> Result<()> {
        Ok(())
    }

    /// Start speaking, cancelling anything still playing
    ///
    /// Returns once audio has started; the handle resolves when it ends.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback cannot start
    async fn speak(&mut self, utterance: Utterance) -> Result<PlaybackHandle>;

    /// Stop the current utterance, if any
    fn cancel(&mut self);
}

#[async_trait]
impl<T: SpeechOutput + ?Sized> SpeechOutput for Box<T> {
    async fn refresh_voices(&mut self) -> Result<()> {
        (**self).refresh_voices().await
    }

    async fn speak(&mut self, utterance: Utterance) -> Result<PlaybackHandle> {
        (**self).speak(utterance).await
    }

    fn cancel(&mut self) {
        (**self).cancel();
    }
}

/// Soften punctuation for a gentler cadence
///
/// Sentence-ending periods become commas (shorter pause) and exclamation
/// marks become periods. Words are never altered.
#[must_use]
pub fn normalize_for_speech(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' if chars.peek().is_none_or(|next| next.is_whitespace()) => out.push(','),
            '!' => out.push('.'),
            other => out.push(other),
        }
    }

    out.trim().to_string()
}

/// Pick a voice by preference order
///
/// Each preference is matched case-insensitively against a voice's id, name
/// and labels; the first preference with any match wins.
#[must_use]
pub fn select_voice<'a>(voices: &'a [VoiceInfo], preferences: &[String]) -> Option<&'a VoiceInfo> {
    preferences.iter().find_map(|pref| {
        let pref = pref.to_lowercase();
        voices.iter().find(|v| {
            v.id.to_lowercase() == pref
                || v.name.to_lowercase().contains(&pref)
                || v.labels.iter().any(|l| l.to_lowercase() == pref)
        })
    })
}

/// Preferred voice tracking with fallback to the provider default
pub struct VoiceSelector<T> {
    tts: T,
    preferences: Vec<String>,
    voice: Option<VoiceInfo>,
}

impl<T: Synthesizer> VoiceSelector<T> {
    pub const fn new(tts: T, preferences: Vec<String>) -> Self {
        Self {
            tts,
            preferences,
            voice: None,
        }
    }

    /// Voice currently in use, `None` meaning the provider default
    #[must_use]
    pub const fn voice(&self) -> Option<&VoiceInfo> {
        self.voice.as_ref()
    }

    /// Re-query the catalog and pick the best preferred voice
    ///
    /// # Errors
    ///
    /// Returns error if the catalog cannot be fetched; the current choice is kept
    pub async fn refresh(&mut self) -> Result<()> {
        let voices = self.tts.list_voices().await?;
        self.voice = select_voice(&voices, &self.preferences).cloned();

        match &self.voice {
            Some(v) => tracing::info!(voice = %v.name, available = voices.len(), "voice selected"),
            None => tracing::info!(
                available = voices.len(),
                "no preferred voice found, using default"
            ),
        }
        Ok(())
    }

    /// Synthesize with the chosen voice
    ///
    /// When the provider rejects that voice the catalog is re-read, the
    /// rejected voice is dropped and the request is retried once on the
    /// default voice.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails, or if the default voice fails too
    pub async fn synthesize(
        &mut self,
        text: &str,
        speed: f32,
        instructions: Option<&str>,
    ) -> Result<Vec<u8>> {
        let voice_id = self.voice.as_ref().map(|v| v.id.clone());
        let request = SpeechRequest {
            text,
            voice: voice_id.as_deref(),
            speed,
            instructions,
        };

        match self.tts.synthesize(&request).await {
            Err(Error::VoiceUnavailable(voice)) if request.voice.is_some() => {
                tracing::warn!(voice = %voice, "voice unavailable, falling back to default");
                if let Err(e) = self.refresh().await {
                    tracing::debug!(error = %e, "voice refresh failed");
                }
                if self.voice.as_ref().is_some_and(|v| v.id == voice) {
                    self.voice = None;
                }
                let fallback = SpeechRequest {
                    voice: None,
                    ..request
                };
                self.tts.synthesize(&fallback).await
            }
            other => other,
        }
    }
}

/// Synthesized speech through the local output device
pub struct Narrator<T = TextToSpeech> {
    voices: VoiceSelector<T>,
    playback: AudioPlayback,
    profile: VoiceProfile,
    current: Option<Arc<AtomicBool>>,
}

impl<T: Synthesizer> Narrator<T> {
    pub const fn new(
        tts: T,
        playback: AudioPlayback,
        profile: VoiceProfile,
        preferences: Vec<String>,
    ) -> Self {
        Self {
            voices: VoiceSelector::new(tts, preferences),
            playback,
            profile,
            current: None,
        }
    }

    /// Voice currently in use, `None` meaning the provider default
    #[must_use]
    pub const fn voice(&self) -> Option<&VoiceInfo> {
        self.voices.voice()
    }
}

#[async_trait]
impl<T: Synthesizer> SpeechOutput for Narrator<T> {
    async fn refresh_voices(&mut self) -> Result<()> {
        self.voices.refresh().await
    }

    async fn speak(&mut self, utterance: Utterance) -> Result<PlaybackHandle> {
        self.cancel();

        let text = normalize_for_speech(&utterance.text);
        if text.is_empty() {
            return Ok(PlaybackHandle::finished());
        }

        let speed = self.profile.rate_for(utterance.pace) / self.profile.pitch;
        let instructions = utterance.mood.map(Mood::speaking_style);
        let mp3 = self.voices.synthesize(&text, speed, instructions).await?;
        let (samples, source_rate) = decode_mp3(&mp3)?;

        // Reinterpreting the clip at a higher source rate raises its pitch;
        // the synthesis speed above already compensated for the tempo change
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let shifted_rate = (source_rate as f32 * self.profile.pitch).round() as u32;
        let samples = resample(&samples, shifted_rate, PLAYBACK_SAMPLE_RATE)?;

        tracing::debug!(
            samples = samples.len(),
            mood = ?utterance.mood,
            pace = ?utterance.pace,
            "speaking"
        );

        let handle = self.playback.start(samples);
        self.current = Some(handle.canceller());
        Ok(handle)
    }

    fn cancel(&mut self) {
        if let Some(flag) = self.current.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Speech output for hosts without a speaker: logs the text and finishes at once
#[derive(Debug, Default)]
pub struct SilentNarrator;

#[async_trait]
impl SpeechOutput for SilentNarrator {
    async fn speak(&mut self, utterance: Utterance) -> Result<PlaybackHandle> {
        tracing::info!(text = %normalize_for_speech(&utterance.text), "assistant says");
        Ok(PlaybackHandle::finished())
    }

    fn cancel(&mut self) {}
}
