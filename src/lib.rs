//! Lingo Pal - speech-practice companion for young learners
//!
//! This library provides the interaction engine behind a spoken practice
//! session:
//! - Phonetic dictionary of target words
//! - Pronunciation checking with focus-phoneme highlighting
//! - Microphone capture and child-friendly speech output
//! - A turn-based session state machine talking to a remote tutor service
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Session                          │
//! │   phase  │  mood  │  history  │  lesson  │  feedback  │
//! └──────┬──────────────┬──────────────────┬─────────────┘
//!        │              │                  │
//! ┌──────▼──────┐ ┌─────▼──────┐ ┌────────▼──────────┐
//! │   Capture   │ │   Tutor    │ │ Correction engine │
//! │ (microphone)│ │  backend   │ │ + dictionary      │
//! └─────────────┘ └────────────┘ └───────────────────┘
//!        speech output (TTS + playback) closes each turn
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod correction;
pub mod error;
pub mod history;
pub mod phonetics;
pub mod session;
pub mod voice;

pub use backend::{HttpTutorBackend, RetryPolicy, Retrying, TutorBackend, TutorReply};
pub use config::Config;
pub use correction::{CorrectionCase, Verdict, evaluate};
pub use error::{Error, Result};
pub use history::{ConversationHistory, Speaker, Turn};
pub use phonetics::{Category, Difficulty, PhoneticDictionary, WordEntry};
pub use session::{FeedbackView, LessonPlan, Mood, Phase, Session, SessionConfig, SessionEvent};
