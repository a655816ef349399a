//! HTTP tutor service client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::retry::is_recoverable;
use super::{TutorBackend, TutorReply};
use crate::history::{Speaker, Turn};
use crate::session::Mood;
use crate::voice::AudioArtifact;
use crate::{Error, Result};

/// Path of the exchange endpoint, relative to the service base URL
const CHAT_PATH: &str = "/api/chat";

/// History entry as the service expects it
#[derive(Serialize)]
struct WireTurn<'a> {
    role: &'a str,
    text: &'a str,
}

impl<'a> From<&'a Turn> for WireTurn<'a> {
    fn from(turn: &'a Turn) -> Self {
        let role = match turn.speaker() {
            Speaker::Learner => "child",
            Speaker::Assistant => "tutor",
        };
        Self {
            role,
            text: turn.text(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    transcription: Option<String>,
    #[serde(alias = "mochiResponse", alias = "response")]
    reply: String,
    #[serde(default)]
    mood: Option<String>,
}

/// Tutor service reached over HTTP (multipart upload, JSON answer)
#[derive(Debug, Clone)]
pub struct HttpTutorBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTutorBackend {
    /// Create a client for the service at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the URL is empty or the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config("tutor service URL is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}{CHAT_PATH}"),
        })
    }

    /// Full URL of the exchange endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TutorBackend for HttpTutorBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn converse(&self, audio: &AudioArtifact, history: &[Turn]) -> Result<TutorReply> {
        let wire_history: Vec<WireTurn<'_>> = history.iter().map(WireTurn::from).collect();
        let history_json = serde_json::to_string(&wire_history)?;

        let audio_part = reqwest::multipart::Part::bytes(audio.bytes.clone())
            .file_name(AudioArtifact::FILE_NAME)
            .mime_str(AudioArtifact::MIME)
            .map_err(|e| Error::remote_fatal(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("audio", audio_part)
            .text("history", history_json);

        tracing::debug!(
            endpoint = %self.endpoint,
            audio_bytes = audio.bytes.len(),
            turns = history.len(),
            "calling tutor service"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "tutor request failed");
                transport_error(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "tutor service error");
            return Err(Error::RemoteCallFailed {
                reason: format!("tutor service returned {status}"),
                retryable: is_recoverable(status.as_u16(), &body),
            });
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let reply = parse_reply(&body)?;

        tracing::info!(
            transcription = reply.transcription.as_deref().unwrap_or(""),
            mood = ?reply.mood,
            "tutor replied"
        );
        Ok(reply)
    }
}

fn transport_error(e: &reqwest::Error) -> Error {
    Error::RemoteCallFailed {
        reason: e.to_string(),
        retryable: e.is_timeout() || e.is_connect(),
    }
}

/// Decode the service's JSON answer
///
/// An empty transcription counts as absent. An unrecognized mood is dropped
/// rather than failing the whole exchange.
///
/// # Errors
///
/// Returns `RemoteCallFailed` if the body is not a valid answer or the reply is empty
pub fn parse_reply(body: &str) -> Result<TutorReply> {
    let wire: WireReply = serde_json::from_str(body)
        .map_err(|e| Error::remote_fatal(format!("malformed tutor reply: {e}")))?;

    let reply_text = wire.reply.trim().to_string();
    if reply_text.is_empty() {
        return Err(Error::remote_fatal("tutor reply was empty"));
    }

    let transcription = wire
        .transcription
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let mood = wire.mood.and_then(|m| match m.parse::<Mood>() {
        Ok(mood) => Some(mood),
        Err(_) => {
            tracing::warn!(mood = %m, "ignoring unknown mood hint");
            None
        }
    });

    Ok(TutorReply {
        transcription,
        reply_text,
        mood,
    })
}
