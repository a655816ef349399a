//! Voice input and output
//!
//! Handles microphone capture, speech synthesis and playback. Recognition
//! happens remotely as part of the tutor exchange (see `backend`).

mod capture;
mod narrator;
mod playback;
mod tts;

pub use capture::{
    AudioArtifact, CaptureOutcome, CapturePipeline, CaptureState, ChunkSink, CpalMicrophone,
    Microphone, SAMPLE_RATE, samples_to_wav,
};
pub use narrator::{
    Narrator, Pace, SilentNarrator, SpeechOutput, Utterance, VoiceProfile, VoiceSelector,
    normalize_for_speech, select_voice,
};
pub use playback::{
    AudioPlayback, PLAYBACK_SAMPLE_RATE, PlaybackHandle, PlaybackSignal, decode_mp3, resample,
};
pub use tts::{SpeechRequest, Synthesizer, TextToSpeech, TtsProvider, VoiceInfo};
