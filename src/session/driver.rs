//! Event loop feeding a session
//!
//! Inputs (taps, replay buttons, playback completions) arrive as messages
//! on one channel and are applied in order, so every transition happens on
//! the session's own task.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use super::machine::Session;
use super::state::Phase;
use crate::Result;
use crate::backend::TutorBackend;
use crate::voice::{Microphone, SpeechOutput};

/// Something that happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Microphone button pressed
    Tap,
    /// Replay the corrected word
    Listen,
    /// Replay the corrected word slowly
    Slow,
    /// An utterance finished playing (or hit the guard timeout)
    PlaybackComplete { utterance: u64, timed_out: bool },
    /// Leave the session
    Quit,
}

impl SessionEvent {
    /// Map a line of terminal input to an event
    #[must_use]
    pub fn from_command(line: &str) -> Option<Self> {
        match line.trim().to_lowercase().as_str() {
            "" => Some(Self::Tap),
            "l" | "listen" => Some(Self::Listen),
            "s" | "slow" => Some(Self::Slow),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Run a session until quit, Ctrl+C or all senders are gone
///
/// # Errors
///
/// Returns error if the shutdown signal handler cannot be installed
#[allow(clippy::future_not_send)]
pub async fn run<M, B, S>(
    mut session: Session<M, B, S>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<()>
where
    M: Microphone,
    B: TutorBackend,
    S: SpeechOutput,
{
    session.start().await;
    tracing::info!(session = %session.id(), "session running");

    let mut backlog = VecDeque::new();
    loop {
        let event = match backlog.pop_front() {
            Some(event) => event,
            None => tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("event channel closed");
                        break;
                    };
                    event
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("interrupted");
                    break;
                }
            },
        };

        // The tap that ends a recording holds the loop for the whole exchange
        let ends_recording = event == SessionEvent::Tap && session.phase() == Phase::Recording;
        if !session.handle(event).await {
            break;
        }
        if ends_recording {
            drop_stale_input(&mut events, &mut backlog);
        }
    }

    session.end();
    Ok(())
}

/// Discard button presses queued while the microphone was disabled
///
/// Completions and quit requests are kept, in order, in `backlog`.
fn drop_stale_input(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    backlog: &mut VecDeque<SessionEvent>,
) {
    let mut dropped = 0usize;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Tap | SessionEvent::Listen | SessionEvent::Slow => dropped += 1,
            other => backlog.push_back(other),
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "ignored input sent while busy");
    }
}
