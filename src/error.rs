//! Error types for the speech-practice engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the speech-practice engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Dictionary data is malformed
    #[error("dictionary error: {0}")]
    Dictionary(String),

    /// Microphone missing or access denied
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// A capture was requested while one is already active
    #[error("a capture is already in progress")]
    AlreadyCapturing,

    /// Stop was requested while nothing is recording
    #[error("not recording")]
    NotRecording,

    /// Capture was requested while the assistant is speaking
    #[error("assistant is still speaking")]
    PlaybackInProgress,

    /// A replay was requested with no correction on screen
    #[error("no correction to replay")]
    NothingToReplay,

    /// Recognition/response backend could not be reached or answered badly
    #[error("remote call failed: {reason}")]
    RemoteCallFailed {
        /// Human-readable cause
        reason: String,
        /// Whether a later attempt could succeed
        retryable: bool,
    },

    /// Requested synthesis voice is not offered by the provider
    #[error("voice unavailable: {0}")]
    VoiceUnavailable(String),

    /// Audio device or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Build a remote failure that is worth retrying
    pub fn remote_retryable(reason: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            reason: reason.into(),
            retryable: true,
        }
    }

    /// Build a remote failure that will not improve on retry
    pub fn remote_fatal(reason: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            reason: reason.into(),
            retryable: false,
        }
    }

    /// Whether this error is a remote failure worth retrying
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RemoteCallFailed {
                retryable: true,
                ..
            }
        )
    }
}
