//! Rate-limit aware retry with exponential backoff.
//!
//! Outbound API calls are wrapped in [`with_retry`]. Failures that look like
//! rate limiting, exhausted quota or a timeout are retried after
//! `initial_wait * 2^attempt` (optionally plus up to one second of jitter);
//! anything else is returned to the caller immediately and unchanged.
//!
//! Providers surface these conditions as generic errors with a human-readable
//! message, so classification is a substring heuristic kept in
//! [`is_retryable`]. Swap that function for status-code checks once the
//! underlying clients expose them.

use crate::error::{AgencyError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Markers that classify a failure as transient.
const RETRYABLE_MARKERS: &[&str] = &[
    "rate limit",
    "quota",
    "timeout",
    "timed out",
    "too many requests",
    "429",
];

/// Random additive delay applied on top of the exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Deterministic delays.
    #[default]
    None,
    /// Adds a uniformly random 0-1s to every delay.
    Uniform,
}

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_wait: Duration,
    jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(20))
    }
}

impl RetryPolicy {
    /// Create a policy. `max_retries` counts total attempts; 0 is treated as 1.
    pub fn new(max_retries: u32, initial_wait: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            initial_wait,
            jitter: Jitter::None,
        }
    }

    /// Set the jitter mode.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_wait(&self) -> Duration {
        self.initial_wait
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Backoff before the retry that follows `attempt` (0-based), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_wait.saturating_mul(factor)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff(attempt);
        match self.jitter {
            Jitter::None => base,
            Jitter::Uniform => base + Duration::from_secs_f64(rand::random::<f64>()),
        }
    }
}

/// Whether an error looks like a transient rate-limit, quota or timeout failure.
pub fn is_retryable(error: &AgencyError) -> bool {
    is_retryable_message(&error.to_string())
}

/// Case-insensitive marker check on a raw error message.
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Run `operation`, retrying transient failures according to `policy`.
///
/// The final error is returned unchanged once attempts run out or as soon as a
/// non-transient failure is seen.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", label, attempt);
                }
                return Ok(value);
            }
            Err(err) if is_retryable(&err) && attempt + 1 < policy.max_retries => {
                let wait = policy.delay_for(attempt);
                warn!(
                    "{} hit a transient failure (attempt {}/{}), retrying in {:.2}s: {}",
                    label,
                    attempt + 1,
                    policy.max_retries,
                    wait.as_secs_f64(),
                    err
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => {
                if is_retryable(&err) {
                    warn!("{} giving up after {} attempts: {}", label, attempt + 1, err);
                }
                return Err(err);
            }
        }
    }
}
