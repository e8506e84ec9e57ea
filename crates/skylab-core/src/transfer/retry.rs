//! Retry policy for the presigned upload.
//!
//! Classifies retryable transport failures and computes the delay between
//! attempts. The actual waiting goes through [`Delay`] so tests can count
//! waits without sleeping.

use crate::config::TransferConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Determine whether a transport error is worth retrying.
///
/// Retryable: connection failures, rate limits (429), server errors (5xx) and
/// failures without a status. Auth failures and bad requests are not.
pub fn is_retryable(error: &TransportError) -> bool {
    match error {
        TransportError::ConnectionRefused(_) | TransportError::RateLimited => true,
        TransportError::Unknown { status, .. } => match status {
            Some(code) => (500..=599).contains(code),
            None => true,
        },
        TransportError::InvalidEndpoint(_)
        | TransportError::InvalidKey
        | TransportError::BadRequest(_) => false,
    }
}

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// `base_delay * 2^retry`, capped at 30 seconds
    Exponential,
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Fixed-delay policy from the transfer settings.
    pub fn from_config(config: &TransferConfig) -> Self {
        Self {
            max_attempts: config.upload_retry_attempts.max(1),
            base_delay: Duration::from_millis(config.upload_retry_delay_ms),
            backoff: Backoff::Fixed,
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                backoff_duration(retry, self.base_delay.as_millis() as u64)
            }
        }
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Something that can wait between attempts.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Waits with `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
