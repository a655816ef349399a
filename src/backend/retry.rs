//! Bounded retry with exponential backoff for the tutor exchange

use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use super::{TutorBackend, TutorReply};
use crate::Result;
use crate::history::Turn;
use crate::voice::AudioArtifact;

/// Retry policy for tutor service calls
///
/// The default performs no retries: a failed exchange is reported straight
/// back to the session, which shows the offline notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy allowing up to `max_retries` extra attempts
    #[must_use]
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Whether an HTTP status and response body indicate a transient failure
///
/// Rate limits (429), server errors (5xx) and network-level failures surfaced
/// in the body text are worth another attempt.
#[must_use]
pub fn is_recoverable(status: u16, body: &str) -> bool {
    if status == 429 || (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset") || lower.contains("timed out") || lower.contains("dns error")
}

/// Delay before retry number `attempt` (0-based)
///
/// `min(base_delay * 2^attempt + jitter, max_delay)`, with 0-25% jitter taken
/// from the system clock's subsecond nanos.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(policy.max_delay);

    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}

/// Wraps a backend and retries retryable failures under a [`RetryPolicy`]
#[derive(Debug)]
pub struct Retrying<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: TutorBackend> Retrying<B> {
    pub const fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<B: TutorBackend> TutorBackend for Retrying<B> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn converse(&self, audio: &AudioArtifact, history: &[Turn]) -> Result<TutorReply> {
        let mut attempt = 0;
        loop {
            match self.inner.converse(audio, history).await {
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = delay_for_attempt(&self.policy, attempt);
                    attempt += 1;
                    tracing::warn!(
                        backend = self.inner.name(),
                        attempt,
                        max = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "tutor call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
