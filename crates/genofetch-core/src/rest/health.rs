//! Cached availability and version state per REST domain
//!
//! One [`HealthRegistry`] is owned by each [`RestClient`](super::RestClient).
//! Probes run with the registry lock held, so concurrent callers wait for the
//! probe in flight instead of issuing their own.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

// ============================================================================
// Refresh Intervals
// ============================================================================

/// Availability is re-probed when older than this
pub const AVAILABILITY_INTERVAL_SECS: i64 = 10;

/// Versions are re-fetched when older than this
pub const VERSION_INTERVAL_SECS: i64 = 3600;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(std::sync::Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainHealth {
    pub available: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_version_check: Option<DateTime<Utc>>,
    pub rest_version: Option<String>,
    pub data_version: Option<String>,
    /// Live REST major version is above the one expected
    pub rest_major_mismatch: bool,
    /// Requests to the domain wait until this has passed
    pub retry_after_until: Option<DateTime<Utc>>,
}

impl DomainHealth {
    /// Unavailable domains are always re-probed
    pub fn needs_ping(&self, now: DateTime<Utc>) -> bool {
        if !self.available {
            return true;
        }
        match self.last_checked {
            Some(at) => now - at > Duration::seconds(AVAILABILITY_INTERVAL_SECS),
            None => true,
        }
    }

    pub fn needs_version_check(&self, now: DateTime<Utc>) -> bool {
        match self.last_version_check {
            Some(at) => now - at > Duration::seconds(VERSION_INTERVAL_SECS),
            None => true,
        }
    }
}

/// Shared map of domain name to [`DomainHealth`]
#[derive(Clone)]
pub struct HealthRegistry {
    domains: Arc<Mutex<HashMap<String, DomainHealth>>>,
    clock: Arc<dyn Clock>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthRegistry").finish_non_exhaustive()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            domains: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Exclusive access for a probe-and-update cycle
    pub async fn lock(&self) -> MutexGuard<'_, HashMap<String, DomainHealth>> {
        self.domains.lock().await
    }

    /// Copy of the current state of `domain`
    pub async fn snapshot(&self, domain: &str) -> Option<DomainHealth> {
        self.domains.lock().await.get(domain).cloned()
    }

    pub async fn record_retry_after(&self, domain: &str, wait: std::time::Duration) {
        let until = self.now() + Duration::milliseconds(wait.as_millis() as i64);
        self.domains
            .lock()
            .await
            .entry(domain.to_string())
            .or_default()
            .retry_after_until = Some(until);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_needs_ping() {
        let now = epoch();
        let mut health = DomainHealth::default();
        assert!(health.needs_ping(now));

        health.available = true;
        health.last_checked = Some(now);
        assert!(!health.needs_ping(now + Duration::seconds(10)));
        assert!(health.needs_ping(now + Duration::seconds(11)));

        health.available = false;
        assert!(health.needs_ping(now));
    }

    #[test]
    fn test_needs_version_check() {
        let now = epoch();
        let health = DomainHealth {
            last_version_check: Some(now),
            ..Default::default()
        };
        assert!(!health.needs_version_check(now + Duration::minutes(59)));
        assert!(health.needs_version_check(now + Duration::minutes(61)));
    }

    #[tokio::test]
    async fn test_registry_records_retry_after() {
        let clock = ManualClock::new(epoch());
        let registry = HealthRegistry::with_clock(Arc::new(clock.clone()));
        registry
            .record_retry_after("http://localhost", std::time::Duration::from_secs(5))
            .await;
        let health = registry.snapshot("http://localhost").await.unwrap();
        assert_eq!(health.retry_after_until, Some(epoch() + Duration::seconds(5)));
        assert!(!health.available);

        clock.advance(Duration::seconds(30));
        assert_eq!(registry.now(), epoch() + Duration::seconds(30));
    }
}
