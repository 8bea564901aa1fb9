//! Rate-limit backoff policy
//!
//! The REST service answers 429 with a `Retry-After` header in seconds. The
//! policy decides how long to wait and how many attempts to make; the
//! [`Sleeper`] performs the wait so tests can observe it without sleeping.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Upper bound on an honored `Retry-After`
    pub max_retry_after: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            max_retry_after: Duration::from_secs(crate::config::DEFAULT_MAX_RETRY_AFTER_SECS),
        }
    }
}

impl BackoffPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        }
    }

    /// Wait before the next attempt, given the raw `Retry-After` header
    ///
    /// Values in `(0, max_retry_after]` seconds are honored. Anything else,
    /// including HTTP-date forms, retries immediately.
    pub fn retry_delay(&self, retry_after: Option<&str>) -> Duration {
        let delay = retry_after
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok());

        match delay {
            Some(d) if d <= self.max_retry_after => d,
            _ => Duration::ZERO,
        }
    }

    /// Whether another attempt follows `attempt` (1-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Performs backoff waits
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested waits instead of sleeping
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.waits().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}
