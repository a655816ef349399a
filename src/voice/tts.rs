//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// A synthesis voice offered by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    /// Identifier passed back on synthesis
    pub id: String,
    /// Display name
    pub name: String,
    /// Descriptive labels (gender, accent, style)
    pub labels: Vec<String>,
}

impl VoiceInfo {
    fn new(id: &str, name: &str, labels: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
        }
    }
}

/// One synthesis call
#[derive(Debug, Clone)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    /// Voice id, or `None` for the configured default
    pub voice: Option<&'a str>,
    /// Speed multiplier (1.0 = normal)
    pub speed: f32,
    /// Style hint for instruction-capable models
    pub instructions: Option<&'a str>,
}

#[derive(Deserialize)]
struct ElevenLabsVoices {
    voices: Vec<ElevenLabsVoice>,
}

#[derive(Deserialize)]
struct ElevenLabsVoice {
    voice_id: String,
    name: String,
    #[serde(default)]
    labels: std::collections::HashMap<String, String>,
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    default_voice: String,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS client for the given provider
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        provider: TtsProvider,
        api_key: String,
        model: String,
        default_voice: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!("{provider:?} API key required for TTS")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            default_voice,
            model,
            provider,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Whether the model accepts free-form style instructions
    #[must_use]
    pub fn supports_instructions(&self) -> bool {
        self.provider == TtsProvider::OpenAI && self.model.starts_with("gpt-4o")
    }

    /// Enumerate voices offered by the provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be queried
    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        match self.provider {
            TtsProvider::OpenAI => Ok(openai_voices()),
            TtsProvider::ElevenLabs => self.list_elevenlabs_voices().await,
        }
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns `VoiceUnavailable` if the provider rejects the voice, or a
    /// TTS error if synthesis fails otherwise
    pub async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>> {
        let voice = request.voice.unwrap_or(&self.default_voice);
        tracing::debug!(
            provider = ?self.provider,
            voice,
            speed = request.speed,
            chars = request.text.len(),
            "synthesizing speech"
        );
        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(request, voice).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(request, voice).await,
        }
    }

    /// Synthesize using OpenAI TTS
    async fn synthesize_openai(&self, request: &SpeechRequest<'_>, voice: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            instructions: Option<&'a str>,
        }

        let body = TtsRequest {
            model: &self.model,
            input: request.text,
            voice,
            speed: request.speed.clamp(0.25, 4.0),
            instructions: request.instructions.filter(|_| self.supports_instructions()),
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 400 && body.contains("voice") {
                return Err(Error::VoiceUnavailable(voice.to_string()));
            }
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(
        &self,
        request: &SpeechRequest<'_>,
        voice: &str,
    ) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct VoiceSettings {
            speed: f32,
        }

        #[derive(Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice}");

        let body = ElevenLabsRequest {
            text: request.text,
            model_id: &self.model,
            // ElevenLabs accepts 0.7-1.2
            voice_settings: VoiceSettings {
                speed: request.speed.clamp(0.7, 1.2),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 || body.contains("voice_not_found") {
                return Err(Error::VoiceUnavailable(voice.to_string()));
            }
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    async fn list_elevenlabs_voices(&self) -> Result<Vec<VoiceInfo>> {
        let response = self
            .client
            .get("https://api.elevenlabs.io/v1/voices")
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Tts(format!("ElevenLabs voice listing failed: {status}")));
        }

        let listing: ElevenLabsVoices = response.json().await?;
        Ok(listing
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.voice_id,
                name: v.name,
                labels: v.labels.into_values().collect(),
            })
            .collect())
    }
}

/// Remote text-to-speech service
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Voices the service currently offers
    ///
    /// # Errors
    ///
    /// Returns error if the catalog cannot be fetched
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>>;

    /// Synthesize one request to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns `VoiceUnavailable` if the requested voice is rejected
    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>>;
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        Self::list_voices(self).await
    }

    async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>> {
        Self::synthesize(self, request).await
    }
}

/// OpenAI's fixed voice set
fn openai_voices() -> Vec<VoiceInfo> {
    vec![
        VoiceInfo::new("alloy", "Alloy", &["neutral"]),
        VoiceInfo::new("ash", "Ash", &["male"]),
        VoiceInfo::new("coral", "Coral", &["female", "warm"]),
        VoiceInfo::new("echo", "Echo", &["male"]),
        VoiceInfo::new("fable", "Fable", &["neutral", "storyteller"]),
        VoiceInfo::new("nova", "Nova", &["female", "friendly"]),
        VoiceInfo::new("onyx", "Onyx", &["male", "deep"]),
        VoiceInfo::new("sage", "Sage", &["female", "calm"]),
        VoiceInfo::new("shimmer", "Shimmer", &["female", "bright"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses() {
        assert_eq!("OpenAI".parse::<TtsProvider>().unwrap(), TtsProvider::OpenAI);
        assert_eq!(
            " elevenlabs ".parse::<TtsProvider>().unwrap(),
            TtsProvider::ElevenLabs
        );
        assert!("festival".parse::<TtsProvider>().is_err());
    }

    #[test]
    fn missing_key_is_rejected() {
        let result = TextToSpeech::new(
            TtsProvider::OpenAI,
            String::new(),
            "tts-1".to_string(),
            "alloy".to_string(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn instructions_only_for_gpt4o_models() {
        let tts = |model: &str| {
            TextToSpeech::new(
                TtsProvider::OpenAI,
                "key".to_string(),
                model.to_string(),
                "alloy".to_string(),
            )
            .unwrap()
        };
        assert!(!tts("tts-1").supports_instructions());
        assert!(tts("gpt-4o-mini-tts").supports_instructions());
    }

    #[tokio::test]
    async fn openai_voices_are_static() {
        let tts = TextToSpeech::new(
            TtsProvider::OpenAI,
            "key".to_string(),
            "tts-1".to_string(),
            "alloy".to_string(),
        )
        .unwrap();
        let voices = tts.list_voices().await.unwrap();
        assert!(voices.iter().any(|v| v.id == "nova"));
    }
}
