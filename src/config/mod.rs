//! Configuration management
//!
//! Every setting resolves as environment variable > TOML file > default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::RetryPolicy;
use crate::session::SessionConfig;
use crate::voice::{TtsProvider, VoiceProfile};
use crate::{Error, Result};

pub use file::{LingoConfigFile, config_file_path};

/// Default tutor service address
const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Default read-only API port
const DEFAULT_API_PORT: u16 = 7878;

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub voice: VoiceConfig,
    pub session: SessionConfig,
    /// Port for the read-only HTTP surface
    pub api_port: u16,
    /// Dictionary overlay merged over the built-in words
    pub dictionary_path: Option<PathBuf>,
    pub api_keys: ApiKeys,
}

/// Tutor service settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// Speech output settings
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub provider: TtsProvider,
    pub tts_model: String,
    pub default_voice: String,
    /// Voice names or labels to prefer, in order
    pub preferred_voices: Vec<String>,
    pub profile: VoiceProfile,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiKeys")
            .field("openai", &redact(&self.openai))
            .field("elevenlabs", &redact(&self.elevenlabs))
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if the TTS provider is unknown or the voice tuning is out of range
    pub fn from_sources(
        fc: LingoConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let provider = match env("LINGOPAL_TTS_PROVIDER").or(fc.voice.provider) {
            Some(p) => p.parse()?,
            None => TtsProvider::default(),
        };

        let default_voice = env("LINGOPAL_TTS_VOICE")
            .or(fc.voice.default_voice)
            .unwrap_or_else(|| default_voice_for(provider).to_string());

        let tts_model = env("LINGOPAL_TTS_MODEL")
            .or(fc.voice.tts_model)
            .unwrap_or_else(|| default_model_for(provider).to_string());

        let defaults = VoiceProfile::default();
        let profile = VoiceProfile {
            rate: fc.voice.rate.unwrap_or(defaults.rate),
            pitch: fc.voice.pitch.unwrap_or(defaults.pitch),
            slow_rate: fc.voice.slow_rate.unwrap_or(defaults.slow_rate),
        };
        validate_profile(&profile)?;

        let session_defaults = SessionConfig::default();
        let session = SessionConfig {
            placeholder_text: fc
                .session
                .placeholder_text
                .unwrap_or(session_defaults.placeholder_text),
            offline_notice: fc
                .session
                .offline_notice
                .unwrap_or(session_defaults.offline_notice),
            listening_notice: fc
                .session
                .listening_notice
                .unwrap_or(session_defaults.listening_notice),
            playback_guard: fc
                .voice
                .playback_guard_secs
                .map_or(session_defaults.playback_guard, Duration::from_secs),
        };

        let backend = BackendConfig {
            url: env("LINGOPAL_BACKEND_URL")
                .or(fc.backend.url)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            timeout: Duration::from_secs(fc.backend.timeout_secs.unwrap_or(30)),
            max_retries: fc.backend.max_retries.unwrap_or(0),
        };

        let api_port = env("LINGOPAL_API_PORT")
            .and_then(|p| p.parse().ok())
            .or(fc.api.port)
            .unwrap_or(DEFAULT_API_PORT);

        let dictionary_path = env("LINGOPAL_DICTIONARY")
            .or(fc.dictionary_path)
            .map(PathBuf::from);

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
        };

        Ok(Self {
            backend,
            voice: VoiceConfig {
                provider,
                tts_model,
                default_voice,
                preferred_voices: fc
                    .voice
                    .preferred_voices
                    .unwrap_or_else(default_preferred_voices),
                profile,
            },
            session,
            api_port,
            dictionary_path,
            api_keys,
        })
    }

    /// API key for the configured TTS provider
    #[must_use]
    pub fn tts_api_key(&self) -> Option<&str> {
        match self.voice.provider {
            TtsProvider::OpenAI => self.api_keys.openai.as_deref(),
            TtsProvider::ElevenLabs => self.api_keys.elevenlabs.as_deref(),
        }
    }

    /// Retry policy for the tutor exchange
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_retries(self.backend.max_retries)
    }
}

const fn default_voice_for(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "nova",
        // "Rachel"
        TtsProvider::ElevenLabs => "21m00Tcm4TlvDq8ikWAM",
    }
}

const fn default_model_for(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::OpenAI => "gpt-4o-mini-tts",
        TtsProvider::ElevenLabs => "eleven_multilingual_v2",
    }
}

fn default_preferred_voices() -> Vec<String> {
    ["Samantha", "Google US English", "nova", "shimmer", "female"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn validate_profile(profile: &VoiceProfile) -> Result<()> {
    let in_range = |v: f32| v > 0.25 && v <= 2.0;
    if !in_range(profile.rate) || !in_range(profile.pitch) || !in_range(profile.slow_rate) {
        return Err(Error::Config(format!(
            "voice tuning out of range (0.25, 2.0]: rate={} pitch={} slow_rate={}",
            profile.rate, profile.pitch, profile.slow_rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn parse(toml_str: &str) -> LingoConfigFile {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn defaults_without_any_source() {
        let config = Config::from_sources(LingoConfigFile::default(), env_from(&[])).unwrap();
        assert_eq!(config.backend.url, DEFAULT_BACKEND_URL);
        assert_eq!(config.backend.max_retries, 0);
        assert_eq!(config.voice.provider, TtsProvider::OpenAI);
        assert_eq!(config.voice.default_voice, "nova");
        assert_eq!(config.api_port, DEFAULT_API_PORT);
        assert_eq!(config.session.placeholder_text, "I was talking!");
        assert!(config.dictionary_path.is_none());
        assert!(config.tts_api_key().is_none());
    }

    #[test]
    fn env_overrides_file() {
        let fc = parse(
            r#"
            [backend]
            url = "http://file:1"
            max_retries = 2

            [api]
            port = 9000
            "#,
        );
        let config = Config::from_sources(
            fc,
            env_from(&[
                ("LINGOPAL_BACKEND_URL", "http://env:2"),
                ("LINGOPAL_API_PORT", "9100"),
            ]),
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://env:2");
        assert_eq!(config.backend.max_retries, 2);
        assert_eq!(config.api_port, 9100);
        assert_eq!(config.retry_policy().max_retries, 2);
    }

    #[test]
    fn unparseable_env_port_falls_back_to_file() {
        let fc = parse("[api]\nport = 9000\n");
        let config = Config::from_sources(fc, env_from(&[("LINGOPAL_API_PORT", "lots")])).unwrap();
        assert_eq!(config.api_port, 9000);
    }

    #[test]
    fn provider_selects_key_and_voice() {
        let fc = parse("[voice]\nprovider = \"elevenlabs\"\n\n[api_keys]\nelevenlabs = \"el-key\"\n");
        let config = Config::from_sources(fc, env_from(&[("OPENAI_API_KEY", "oa-key")])).unwrap();
        assert_eq!(config.voice.provider, TtsProvider::ElevenLabs);
        assert_eq!(config.tts_api_key(), Some("el-key"));
        assert_eq!(config.voice.tts_model, "eleven_multilingual_v2");
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let result = Config::from_sources(
            LingoConfigFile::default(),
            env_from(&[("LINGOPAL_TTS_PROVIDER", "festival")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_tuning_is_rejected() {
        let fc = parse("[voice]\npitch = 5.0\n");
        assert!(Config::from_sources(fc, env_from(&[])).is_err());
    }

    #[test]
    fn file_values_are_read_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "dictionary_path = \"/tmp/words.toml\"\n[voice]\nrate = 0.8\nplayback_guard_secs = 5\n[session]\noffline_notice = \"Nap time\""
        )
        .unwrap();

        let fc = file::load_config_file_from(tmp.path());
        let config = Config::from_sources(fc, env_from(&[])).unwrap();
        assert!((config.voice.profile.rate - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.session.playback_guard, Duration::from_secs(5));
        assert_eq!(config.session.offline_notice, "Nap time");
        assert_eq!(config.dictionary_path, Some(PathBuf::from("/tmp/words.toml")));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[backend\nurl = ").unwrap();
        let fc = file::load_config_file_from(tmp.path());
        assert!(fc.backend.url.is_none());
    }

    #[test]
    fn debug_output_hides_keys() {
        let keys = ApiKeys {
            openai: Some("sk-secret".to_string()),
            elevenlabs: None,
        };
        let shown = format!("{keys:?}");
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("redacted"));
    }
}
