//! Remote recognition and response service
//!
//! One exchange sends the learner's recording together with the conversation
//! so far and receives a transcription, the tutor's reply and an optional
//! mood hint. The service is a black box; only call/await/fail matters here.

mod http;
mod retry;

pub use http::{HttpTutorBackend, parse_reply};
pub use retry::{RetryPolicy, Retrying, delay_for_attempt, is_recoverable};

use async_trait::async_trait;

use crate::Result;
use crate::history::Turn;
use crate::session::Mood;
use crate::voice::AudioArtifact;

/// What the tutor service answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorReply {
    /// What the learner said, absent when recognition found nothing
    pub transcription: Option<String>,
    /// What the assistant says back
    pub reply_text: String,
    /// Suggested presentation mood
    pub mood: Option<Mood>,
}

/// A recognition/response service
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &'static str;

    /// Run one exchange
    ///
    /// # Errors
    ///
    /// Returns `RemoteCallFailed` on any transport or service error
    async fn converse(&self, audio: &AudioArtifact, history: &[Turn]) -> Result<TutorReply>;
}

