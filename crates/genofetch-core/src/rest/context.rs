//! Per-request context: id, deadline and cancellation

use crate::error::{EnsemblError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Threaded through every network call of one logical request
///
/// Clones share the cancellation token, so cancelling any clone stops them
/// all.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: Uuid,
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with `Cancelled` once the token fires or the deadline passes
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(EnsemblError::cancelled(format!("request {} was cancelled", self.id)));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(EnsemblError::cancelled(format!(
                "request {} passed its deadline",
                self.id
            )));
        }
        Ok(())
    }

    /// Time left before the deadline, if one is set
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}
