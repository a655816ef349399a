//! Session-visible state: phase, mood and the feedback projection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::correction::CorrectionCase;
use crate::{Error, Result};

/// Coarse emotional state driving presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Neutral,
    #[default]
    Happy,
    Encouraging,
    Celebrating,
}

impl Mood {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Happy => "HAPPY",
            Self::Encouraging => "ENCOURAGING",
            Self::Celebrating => "CELEBRATING",
        }
    }

    /// Delivery hint for instruction-capable speech models
    #[must_use]
    pub const fn speaking_style(self) -> &'static str {
        match self {
            Self::Neutral => "Speak calmly and clearly to a young child.",
            Self::Happy => "Speak warmly and cheerfully to a young child.",
            Self::Encouraging => {
                "Speak gently and patiently, encouraging a young child to try again."
            }
            Self::Celebrating => "Sound thrilled, cheering for a young child who just succeeded.",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NEUTRAL" => Ok(Self::Neutral),
            "HAPPY" => Ok(Self::Happy),
            "ENCOURAGING" => Ok(Self::Encouraging),
            "CELEBRATING" => Ok(Self::Celebrating),
            other => Err(Error::Config(format!("unknown mood: {other}"))),
        }
    }
}

/// Position on the per-turn timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    ListeningForTap,
    Recording,
    Thinking,
    Speaking,
}

impl Phase {
    /// Whether a tap would start a recording
    #[must_use]
    pub const fn accepts_tap(self) -> bool {
        matches!(self, Self::ListeningForTap | Self::Recording)
    }
}

/// One target phoneme as shown on the correction card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhonemeView {
    pub phoneme: String,
    pub focus: bool,
}

/// Correction card contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionView {
    pub heard_word: String,
    pub target_word: String,
    pub target_sound: String,
    pub phonemes: Vec<PhonemeView>,
    pub prompt: String,
}

impl From<&CorrectionCase> for CorrectionView {
    fn from(case: &CorrectionCase) -> Self {
        Self {
            heard_word: case.heard_word.clone(),
            target_word: case.target.word.clone(),
            target_sound: case.target.target_sound.clone(),
            phonemes: case
                .marked_phonemes()
                .into_iter()
                .map(|m| PhonemeView {
                    phoneme: m.phoneme.to_string(),
                    focus: m.focus,
                })
                .collect(),
            prompt: case.prompt(),
        }
    }
}

/// Read-only projection of the session for display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FeedbackView {
    pub phase: Phase,
    pub mood: Mood,
    pub is_recording: bool,
    /// True from the end of recording until playback completes
    pub is_thinking: bool,
    pub feedback_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<CorrectionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word: Option<String>,
    pub history_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_parses_case_insensitively() {
        assert_eq!("celebrating".parse::<Mood>().unwrap(), Mood::Celebrating);
        assert_eq!(" Encouraging ".parse::<Mood>().unwrap(), Mood::Encouraging);
        assert!("sleepy".parse::<Mood>().is_err());
    }

    #[test]
    fn session_starts_happy_and_listening() {
        assert_eq!(Mood::default(), Mood::Happy);
        assert_eq!(Phase::default(), Phase::ListeningForTap);
    }

    #[test]
    fn view_serializes_screaming_case() {
        let view = FeedbackView {
            mood: Mood::Celebrating,
            phase: Phase::Speaking,
            ..FeedbackView::default()
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["mood"], "CELEBRATING");
        assert_eq!(json["phase"], "SPEAKING");
        assert!(json.get("correction").is_none());
    }
}
