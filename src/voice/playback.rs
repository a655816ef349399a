//! Audio playback to speakers

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use tokio::sync::oneshot;

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Completion handle for one playback
///
/// Resolves when the clip finishes, is cancelled, or the device fails.
#[derive(Debug)]
pub struct PlaybackHandle {
    done: oneshot::Receiver<()>,
    cancel: Arc<AtomicBool>,
    length: Duration,
}

/// Producer side of a [`PlaybackHandle`]
#[derive(Debug)]
pub struct PlaybackSignal {
    done: oneshot::Sender<()>,
    cancel: Arc<AtomicBool>,
}

impl PlaybackHandle {
    /// Create a linked handle/signal pair
    #[must_use]
    pub fn channel() -> (PlaybackSignal, Self) {
        let (tx, rx) = oneshot::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        (
            PlaybackSignal {
                done: tx,
                cancel: Arc::clone(&cancel),
            },
            Self {
                done: rx,
                cancel,
                length: Duration::ZERO,
            },
        )
    }

    /// Declare how long the clip plays
    #[must_use]
    pub const fn with_length(mut self, length: Duration) -> Self {
        self.length = length;
        self
    }

    /// Expected play time, zero when unknown
    #[must_use]
    pub const fn length(&self) -> Duration {
        self.length
    }

    /// A handle that is already complete
    #[must_use]
    pub fn finished() -> Self {
        let (signal, handle) = Self::channel();
        signal.complete();
        handle
    }

    /// Ask the producer to stop early
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// A cancel switch that can outlive the handle
    #[must_use]
    pub fn canceller(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Wait for playback to end
    pub async fn wait(self) {
        // A dropped sender also means playback is over
        let _ = self.done.await;
    }
}

impl PlaybackSignal {
    /// Whether the consumer asked to stop
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Report completion
    pub fn complete(self) {
        let _ = self.done.send(());
    }
}

/// Plays audio to the default output device
#[derive(Debug, Clone)]
pub struct AudioPlayback {
    config: StreamConfig,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { config })
    }

    /// Start playing samples at [`PLAYBACK_SAMPLE_RATE`]
    ///
    /// Returns immediately; the device runs on a blocking worker and the
    /// returned handle resolves when the clip ends or is cancelled.
    #[must_use]
    pub fn start(&self, samples: Vec<f32>) -> PlaybackHandle {
        let (signal, handle) = PlaybackHandle::channel();
        let handle = handle.with_length(clip_length(samples.len()));
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            if let Err(e) = play_blocking(&config, samples, &signal) {
                tracing::error!(error = %e, "playback failed");
            }
            signal.complete();
        });

        handle
    }
}

/// Play time of `samples` at [`PLAYBACK_SAMPLE_RATE`]
#[must_use]
pub fn clip_length(samples: usize) -> Duration {
    Duration::from_millis(samples as u64 * 1000 / u64::from(PLAYBACK_SAMPLE_RATE))
}

/// Play samples on the calling thread until done, cancelled or timed out
fn play_blocking(config: &StreamConfig, samples: Vec<f32>, signal: &PlaybackSignal) -> Result<()> {
    if samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = config.channels as usize;
    let sample_count = samples.len();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_cb = Arc::clone(&finished);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(position).copied().unwrap_or_else(|| {
                        finished_cb.store(true, Ordering::SeqCst);
                        0.0
                    });
                    frame.fill(sample);
                    position = (position + 1).min(samples.len());
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    let length = clip_length(sample_count);
    let start = Instant::now();
    let timeout = length + Duration::from_millis(500);

    while !finished.load(Ordering::SeqCst) {
        if signal.is_cancelled() {
            tracing::debug!("playback cancelled");
            break;
        }
        if start.elapsed() > timeout {
            tracing::warn!(length_ms = length.as_millis(), "playback did not drain in time");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Small delay to ensure audio finishes
    if !signal.is_cancelled() {
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");

    Ok(())
}

/// Decode MP3 bytes to mono f32 samples, returning the source sample rate
///
/// # Errors
///
/// Returns error if the data is not decodable MP3
pub fn decode_mp3(mp3_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = PLAYBACK_SAMPLE_RATE;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = u32::try_from(frame.sample_rate).unwrap_or(sample_rate);
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok((samples, sample_rate))
}

/// Resample mono audio using rubato
///
/// # Errors
///
/// Returns error if the resampler cannot be built or fails
#[allow(clippy::cast_possible_truncation)]
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let chunk_size = 1024;
    let sub_chunks = 2;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, sub_chunks, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let mut output = Vec::with_capacity(samples.len() * to_rate as usize / from_rate as usize + 1);
    let mut pos = 0;

    while pos < input.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(input.len());
        let chunk = &input[pos..end];
        let result = if chunk.len() == needed {
            resampler.process(&[chunk], None)
        } else {
            resampler.process_partial(Some(&[chunk][..]), None)
        }
        .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
        pos = end;
    }

    Ok(output.iter().map(|&s| s as f32).collect())
}
