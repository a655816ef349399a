//! Microphone capture lifecycle
//!
//! `CapturePipeline` owns the per-turn recording buffer and drives a
//! [`Microphone`] through `Idle → Acquiring → Recording → Stopping → Idle`.
//! The device is released on every exit path from `Recording`/`Stopping`.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Lifecycle state of the capture pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Acquiring,
    Recording,
    Stopping,
}

/// How the last capture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    ArtifactReady,
    CaptureFailed,
}

/// Ordered collection of audio chunks, shared with the device callback
#[derive(Debug, Clone, Default)]
pub struct ChunkSink {
    chunks: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl ChunkSink {
    /// Append a chunk in arrival order
    pub fn push(&self, chunk: &[f32]) {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(chunk.to_vec());
        }
    }

    /// Number of chunks buffered so far
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Take every buffered chunk, leaving the sink empty
    #[must_use]
    pub fn drain(&self) -> Vec<Vec<f32>> {
        self.chunks
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }

    /// Samples from the most recent chunks, up to `max` samples
    #[must_use]
    pub fn tail(&self, max: usize) -> Vec<f32> {
        let Ok(chunks) = self.chunks.lock() else {
            return Vec::new();
        };
        let mut tail: Vec<f32> = Vec::with_capacity(max);
        for chunk in chunks.iter().rev() {
            if tail.len() >= max {
                break;
            }
            let take = (max - tail.len()).min(chunk.len());
            tail.splice(0..0, chunk[chunk.len() - take..].iter().copied());
        }
        tail
    }
}

/// Exclusive access to an input device
pub trait Microphone {
    /// Sample rate of delivered chunks
    fn sample_rate(&self) -> u32;

    /// Acquire the device and start delivering chunks into `sink`
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the device is missing or access is denied
    fn acquire(&mut self, sink: ChunkSink) -> Result<()>;

    /// Free the device; calling it when nothing is held is a no-op
    fn release(&mut self);
}

/// Default system input device via cpal
pub struct CpalMicrophone {
    config: StreamConfig,
    stream: Option<Stream>,
}

impl Default for CpalMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalMicrophone {
    /// Create a microphone handle without touching the hardware
    ///
    /// The device is looked up on every [`Microphone::acquire`], so a
    /// microphone plugged in after startup is picked up on the next tap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: StreamConfig {
                channels: 1,
                sample_rate: SampleRate(SAMPLE_RATE),
                buffer_size: cpal::BufferSize::Default,
            },
            stream: None,
        }
    }
}

impl Microphone for CpalMicrophone {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn acquire(&mut self, sink: ChunkSink) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::DeviceUnavailable("no input device available".to_string()))?;

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| {
                Error::DeviceUnavailable("no mono 16kHz input config found".to_string())
            })?;

        self.config = supported
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink.push(data),
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone acquired"
        );

        self.stream = Some(stream);
        Ok(())
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("microphone released");
        }
    }
}

/// A finalized recording, ready to send to the recognition backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// WAV container bytes
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
    pub sample_count: usize,
}

impl AudioArtifact {
    /// Container MIME type
    pub const MIME: &'static str = "audio/wav";

    /// Suggested upload file name
    pub const FILE_NAME: &'static str = "utterance.wav";

    /// Recorded duration in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.sample_count as u64 * 1000) / u64::from(self.sample_rate)
    }
}

/// Drives one microphone through the per-turn recording lifecycle
pub struct CapturePipeline<M: Microphone> {
    microphone: M,
    state: CaptureState,
    sink: ChunkSink,
    last_outcome: Option<CaptureOutcome>,
}

impl<M: Microphone> CapturePipeline<M> {
    pub fn new(microphone: M) -> Self {
        Self {
            microphone,
            state: CaptureState::Idle,
            sink: ChunkSink::default(),
            last_outcome: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> CaptureState {
        self.state
    }

    /// How the previous capture ended, if any finished yet
    #[must_use]
    pub const fn last_outcome(&self) -> Option<CaptureOutcome> {
        self.last_outcome
    }

    /// Chunks buffered by the in-flight recording
    #[must_use]
    pub fn buffered_chunks(&self) -> usize {
        self.sink.chunk_count()
    }

    /// Recent samples of the in-flight recording, for level meters
    #[must_use]
    pub fn recent_samples(&self, max: usize) -> Vec<f32> {
        self.sink.tail(max)
    }

    /// Acquire the microphone and begin buffering
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCapturing` unless idle, or `DeviceUnavailable` if the
    /// device cannot be acquired (state is back to `Idle` in that case)
    pub fn start_capture(&mut self) -> Result<()> {
        if self.state != CaptureState::Idle {
            return Err(Error::AlreadyCapturing);
        }

        self.state = CaptureState::Acquiring;
        let _ = self.sink.drain();

        match self.microphone.acquire(self.sink.clone()) {
            Ok(()) => {
                self.state = CaptureState::Recording;
                tracing::info!("capture started");
                Ok(())
            }
            Err(e) => {
                self.microphone.release();
                let _ = self.sink.drain();
                self.state = CaptureState::Idle;
                tracing::warn!(error = %e, "capture could not start");
                Err(e)
            }
        }
    }

    /// Stop recording and assemble the buffered chunks into an artifact
    ///
    /// # Errors
    ///
    /// Returns `NotRecording` (state unchanged) unless recording, or an audio
    /// error if encoding fails
    pub fn stop_capture(&mut self) -> Result<AudioArtifact> {
        if self.state != CaptureState::Recording {
            return Err(Error::NotRecording);
        }

        self.state = CaptureState::Stopping;
        self.microphone.release();

        let chunks = self.sink.drain();
        let sample_rate = self.microphone.sample_rate();
        let samples: Vec<f32> = chunks.concat();

        let result = samples_to_wav(&samples, sample_rate).map(|bytes| AudioArtifact {
            bytes,
            sample_rate,
            sample_count: samples.len(),
        });

        self.state = CaptureState::Idle;
        match &result {
            Ok(artifact) => {
                self.last_outcome = Some(CaptureOutcome::ArtifactReady);
                tracing::info!(
                    chunks = chunks.len(),
                    duration_ms = artifact.duration_ms(),
                    "capture finalized"
                );
            }
            Err(e) => {
                self.last_outcome = Some(CaptureOutcome::CaptureFailed);
                tracing::error!(error = %e, "capture finalization failed");
            }
        }
        result
    }

    /// Drop any in-flight recording and free the device
    pub fn abort(&mut self) {
        self.microphone.release();
        let _ = self.sink.drain();
        if self.state != CaptureState::Idle {
            tracing::debug!(state = ?self.state, "capture aborted");
        }
        self.state = CaptureState::Idle;
    }
}

impl<M: Microphone> Drop for CapturePipeline<M> {
    fn drop(&mut self) {
        self.microphone.release();
    }
}

/// Convert f32 samples to WAV bytes for recognition APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedMic {
        deny: bool,
        chunks: Vec<Vec<f32>>,
        held: bool,
    }

    impl Microphone for ScriptedMic {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn acquire(&mut self, sink: ChunkSink) -> Result<()> {
            if self.deny {
                return Err(Error::DeviceUnavailable("permission denied".to_string()));
            }
            self.held = true;
            for chunk in &self.chunks {
                sink.push(chunk);
            }
            Ok(())
        }

        fn release(&mut self) {
            self.held = false;
        }
    }

    fn pipeline(deny: bool, chunks: Vec<Vec<f32>>) -> CapturePipeline<ScriptedMic> {
        CapturePipeline::new(ScriptedMic {
            deny,
            chunks,
            held: false,
        })
    }

    #[test]
    fn start_then_stop_yields_concatenated_artifact() {
        let mut capture = pipeline(false, vec![vec![0.1; 160], vec![0.2; 80]]);
        capture.start_capture().unwrap();
        assert_eq!(capture.state(), CaptureState::Recording);
        assert!(capture.microphone.held);
        assert_eq!(capture.buffered_chunks(), 2);

        let artifact = capture.stop_capture().unwrap();
        assert_eq!(artifact.sample_count, 240);
        assert_eq!(&artifact.bytes[0..4], b"RIFF");
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.last_outcome(), Some(CaptureOutcome::ArtifactReady));
        assert!(!capture.microphone.held);
    }

    #[test]
    fn chunks_keep_arrival_order() {
        let mut capture = pipeline(false, vec![vec![0.5], vec![-0.5]]);
        capture.start_capture().unwrap();
        let artifact = capture.stop_capture().unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(artifact.bytes)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert!(samples[0] > 0);
        assert!(samples[1] < 0);
    }

    #[test]
    fn denied_device_leaves_pipeline_idle() {
        let mut capture = pipeline(true, Vec::new());
        let err = capture.start_capture().unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(!capture.microphone.held);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut capture = pipeline(false, Vec::new());
        capture.start_capture().unwrap();
        assert!(matches!(
            capture.start_capture(),
            Err(Error::AlreadyCapturing)
        ));
        assert_eq!(capture.state(), CaptureState::Recording);
    }

    #[test]
    fn stop_without_recording_is_rejected() {
        let mut capture = pipeline(false, Vec::new());
        assert!(matches!(capture.stop_capture(), Err(Error::NotRecording)));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(capture.last_outcome(), None);
    }

    #[test]
    fn abort_releases_device() {
        let mut capture = pipeline(false, vec![vec![0.0; 10]]);
        capture.start_capture().unwrap();
        capture.abort();
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(!capture.microphone.held);
        assert_eq!(capture.buffered_chunks(), 0);
    }

    #[test]
    fn tail_returns_latest_samples() {
        let sink = ChunkSink::default();
        sink.push(&[1.0, 2.0]);
        sink.push(&[3.0, 4.0, 5.0]);
        assert_eq!(sink.tail(4), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sink.tail(10).len(), 5);
    }

    #[test]
    fn artifact_duration() {
        let artifact = AudioArtifact {
            bytes: Vec::new(),
            sample_rate: SAMPLE_RATE,
            sample_count: 8000,
        };
        assert_eq!(artifact.duration_ms(), 500);
    }
}
