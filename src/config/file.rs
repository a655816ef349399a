//! TOML configuration file loading
//!
//! Supports `~/.config/lingopal/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct LingoConfigFile {
    /// Tutor service configuration
    #[serde(default)]
    pub backend: BackendFileConfig,

    /// Speech output configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Feedback texts and timing
    #[serde(default)]
    pub session: SessionFileConfig,

    /// Read-only HTTP surface
    #[serde(default)]
    pub api: ApiFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Extra dictionary entries merged over the built-in words
    pub dictionary_path: Option<String>,
}

/// Tutor service configuration
#[derive(Debug, Default, Deserialize)]
pub struct BackendFileConfig {
    /// Base URL (e.g. "http://localhost:5000")
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Extra attempts for transient failures
    pub max_retries: Option<u32>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// TTS provider ("openai", "elevenlabs")
    pub provider: Option<String>,

    /// TTS model (e.g. "gpt-4o-mini-tts")
    pub tts_model: Option<String>,

    /// Voice used when no preferred voice is found
    pub default_voice: Option<String>,

    /// Voice names or labels to look for, in order
    pub preferred_voices: Option<Vec<String>>,

    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub slow_rate: Option<f32>,

    /// Longest a single playback may hold the session
    pub playback_guard_secs: Option<u64>,
}

/// Feedback texts
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub placeholder_text: Option<String>,
    pub offline_notice: Option<String>,
    pub listening_notice: Option<String>,
}

/// HTTP surface configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    pub port: Option<u16>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `LingoConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> LingoConfigFile {
    config_file_path().map_or_else(LingoConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing, unreadable or invalid files yield defaults.
pub fn load_config_file_from(path: &Path) -> LingoConfigFile {
    if !path.exists() {
        return LingoConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                LingoConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LingoConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/lingopal/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("lingopal").join("config.toml"))
}
