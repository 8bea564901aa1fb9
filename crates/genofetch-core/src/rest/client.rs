//! Resilient JSON client for the REST service
//!
//! Requests for more than one id are POSTed as `{"ids": [...]}`; everything
//! else is a GET. HTTP 429 is retried under the [`BackoffPolicy`], and any
//! other non-success status is "no data" rather than an error. A
//! `Retry-After` is remembered per domain, and the next request to that
//! domain waits it out first.

use crate::config::ClientConfig;
use crate::error::{EnsemblError, Result};
use crate::rest::backoff::{BackoffPolicy, Sleeper, TokioSleeper};
use crate::rest::context::RequestContext;
use crate::rest::endpoints;
use crate::rest::health::{DomainHealth, HealthRegistry};
use crate::rest::scalar_string;
use genofetch_common::types::ReleaseVersion;
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// MIME types sent on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypes {
    pub content_type: String,
    pub accept: String,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self {
            content_type: "application/json".to_string(),
            accept: "application/json".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: Arc<ClientConfig>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    registry: HealthRegistry,
    mime: MimeTypes,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("domain", &self.config.domain)
            .field("policy", &self.policy)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Validate `config` and build a client with a fresh health registry
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("genofetch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            policy: BackoffPolicy::from_config(&config),
            config: Arc::new(config),
            sleeper: Arc::new(TokioSleeper),
            registry: HealthRegistry::new(),
            mime: MimeTypes::default(),
        })
    }

    pub fn with_registry(mut self, registry: HealthRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mime_types(mut self, mime: MimeTypes) -> Self {
        self.mime = mime;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    /// Fetch JSON, demoting every non-fatal failure to `None`
    ///
    /// Only cancellation is returned as an error. Network failures, parse
    /// failures and exhausted rate-limit retries are logged.
    pub async fn fetch_json(
        &self,
        ctx: &RequestContext,
        url: &str,
        ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<Option<Value>> {
        match self.request_json(ctx, url, ids, timeout).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(url = %url, error = %e, "Request failed, treating as no data");
                Ok(None)
            }
        }
    }

    /// GET `url` with the default read timeout
    pub async fn get_json(&self, ctx: &RequestContext, url: &str) -> Result<Option<Value>> {
        self.fetch_json(ctx, url, &[], None).await
    }

    /// Fetch JSON, returning typed errors
    ///
    /// `Ok(None)` means the service answered with a non-success status other
    /// than 429.
    pub async fn request_json(
        &self,
        ctx: &RequestContext,
        url: &str,
        ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<Option<Value>> {
        self.execute(ctx, url, ids, timeout, true).await
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        url: &str,
        ids: &[String],
        timeout: Option<Duration>,
        track_retry_after: bool,
    ) -> Result<Option<Value>> {
        let read_timeout = timeout.unwrap_or(Duration::from_secs(self.config.read_timeout_secs));
        let max_attempts = self.policy.max_attempts.max(1);
        let domain = if track_retry_after {
            self.domain_key(url)
        } else {
            None
        };

        for attempt in 1..=max_attempts {
            ctx.check()?;
            // retries already wait for their own Retry-After
            if attempt == 1 {
                if let Some(domain) = &domain {
                    self.wait_for_retry_after(ctx, domain).await?;
                }
            }
            let timeout = ctx
                .remaining()
                .map_or(read_timeout, |left| left.min(read_timeout));

            debug!(url = %url, attempt, ids = ids.len(), request_id = %ctx.id(), "REST request");
            let request = self.build_request(url, ids).timeout(timeout);

            let sent = tokio::select! {
                _ = ctx.token().cancelled() => {
                    return Err(EnsemblError::cancelled(format!("request {} cancelled during {}", ctx.id(), url)));
                }
                sent = request.send() => sent,
            };
            let response = sent.map_err(|e| EnsemblError::network(format!("{}: {}", url, e)))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let delay = self.policy.retry_delay(retry_after.as_deref());

                if let Some(domain) = &domain {
                    self.registry.record_retry_after(domain, delay).await;
                }

                if !self.policy.should_retry(attempt) {
                    break;
                }

                warn!(
                    url = %url,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, retrying"
                );
                tokio::select! {
                    _ = ctx.token().cancelled() => {
                        return Err(EnsemblError::cancelled(format!("request {} cancelled while backing off", ctx.id())));
                    }
                    _ = self.sleeper.sleep(delay) => {}
                }
                continue;
            }

            if !status.is_success() {
                debug!(url = %url, status = %status, "No data returned");
                return Ok(None);
            }

            let body = response
                .text()
                .await
                .map_err(|e| EnsemblError::network(format!("{}: {}", url, e)))?;
            let value = serde_json::from_str(&body)
                .map_err(|e| EnsemblError::parse(format!("{}: {}", url, e)))?;
            return Ok(Some(value));
        }

        Err(EnsemblError::RateLimited {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }

    /// Registry key for `url`: the configured domain it falls under, else its origin
    fn domain_key(&self, url: &str) -> Option<String> {
        [&self.config.domain, &self.config.genomes_domain]
            .into_iter()
            .filter(|d| url.starts_with(d.as_str()))
            .max_by_key(|d| d.len())
            .cloned()
            .or_else(|| origin_of(url))
    }

    /// Sleep until an earlier `Retry-After` for `domain` has passed
    ///
    /// The wait is capped at the policy's `max_retry_after`.
    async fn wait_for_retry_after(&self, ctx: &RequestContext, domain: &str) -> Result<()> {
        let Some(until) = self
            .registry
            .snapshot(domain)
            .await
            .and_then(|h| h.retry_after_until)
        else {
            return Ok(());
        };
        let Ok(left) = (until - self.registry.now()).to_std() else {
            return Ok(());
        };
        if left.is_zero() {
            return Ok(());
        }

        let wait = left.min(self.policy.max_retry_after);
        debug!(domain = %domain, wait_ms = wait.as_millis() as u64, "Waiting out Retry-After");
        tokio::select! {
            _ = ctx.token().cancelled() => {
                Err(EnsemblError::cancelled(format!("request {} cancelled while backing off", ctx.id())))
            }
            _ = self.sleeper.sleep(wait) => Ok(()),
        }
    }

    fn build_request(&self, url: &str, ids: &[String]) -> RequestBuilder {
        let builder = if ids.len() > 1 {
            self.http.post(url)
        } else {
            self.http.get(url)
        };
        let builder = builder
            .header(CONTENT_TYPE, &self.mime.content_type)
            .header(ACCEPT, &self.mime.accept);

        if ids.len() > 1 {
            let trimmed: Vec<&str> = ids.iter().map(|id| id.trim()).collect();
            builder.json(&json!({ "ids": trimmed }))
        } else {
            builder
        }
    }

    /// Whether `domain` answers its ping, refreshing cached state as needed
    ///
    /// The registry lock is held for the whole probe.
    pub async fn is_available(&self, ctx: &RequestContext, domain: &str) -> Result<bool> {
        ctx.check()?;
        let mut domains = self.registry.lock().await;
        let now = self.registry.now();
        let health = domains.entry(domain.to_string()).or_default();

        if health.needs_ping(now) {
            health.available = self.ping(ctx, domain).await?;
            health.last_checked = Some(now);
            if !health.available {
                warn!(domain = %domain, "REST service is not available");
            }
        }

        if health.available && health.needs_version_check(now) {
            self.check_versions(ctx, domain, health).await?;
            health.last_version_check = Some(now);
        }

        Ok(health.available)
    }

    /// Data release last reported by `domain`, probing if needed
    pub async fn data_version(&self, ctx: &RequestContext, domain: &str) -> Result<Option<String>> {
        self.is_available(ctx, domain).await?;
        Ok(self
            .registry
            .snapshot(domain)
            .await
            .and_then(|h| h.data_version))
    }

    pub async fn domain_health(&self, domain: &str) -> Option<DomainHealth> {
        self.registry.snapshot(domain).await
    }

    async fn ping(&self, ctx: &RequestContext, domain: &str) -> Result<bool> {
        let timeout = Duration::from_secs(self.config.ping_timeout_secs);
        let response = self.probe(ctx, &endpoints::ping_url(domain), timeout).await?;
        Ok(response.is_some_and(|v| v.get("ping").is_some()))
    }

    async fn check_versions(
        &self,
        ctx: &RequestContext,
        domain: &str,
        health: &mut DomainHealth,
    ) -> Result<()> {
        let timeout = Duration::from_secs(self.config.read_timeout_secs);

        let release = self
            .probe(ctx, &endpoints::rest_version_url(domain), timeout)
            .await?
            .and_then(|v| v.get("release").and_then(scalar_string));

        if let Some(release) = release {
            let expected = self.config.expected_version_for(domain);
            match (
                release.parse::<ReleaseVersion>(),
                expected.parse::<ReleaseVersion>(),
            ) {
                (Ok(live), Ok(wanted)) => {
                    health.rest_major_mismatch = live.major() > wanted.major();
                    if health.rest_major_mismatch {
                        warn!(
                            domain = %domain,
                            live = %live,
                            expected = %wanted,
                            "REST major version is newer than this client supports"
                        );
                    } else if live > wanted {
                        info!(domain = %domain, live = %live, expected = %wanted, "Later REST version available");
                    }
                }
                _ => warn!(domain = %domain, release = %release, "Unrecognised REST version"),
            }
            health.rest_version = Some(release);
        }

        let data = self
            .probe(ctx, &endpoints::data_version_url(domain), timeout)
            .await?
            .and_then(|v| {
                v.get("releases")
                    .and_then(|r| r.get(0))
                    .and_then(scalar_string)
            });
        if data.is_some() {
            health.data_version = data;
        }

        Ok(())
    }

    // health probes bypass retry-after tracking, the registry is already locked
    async fn probe(
        &self,
        ctx: &RequestContext,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<Value>> {
        match self.execute(ctx, url, &[], Some(timeout), false).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(url = %url, error = %e, "Probe failed");
                Ok(None)
            }
        }
    }
}

/// `scheme://host[:port]` of a URL
fn origin_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
}
