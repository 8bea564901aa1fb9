//! Client configuration
//!
//! Defaults target the public Ensembl REST service. Every field can be
//! overridden from `GENOFETCH_*` environment variables or the builder.

use crate::error::{EnsemblError, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Client Configuration Constants
// ============================================================================

/// Primary REST domain
pub const DEFAULT_DOMAIN: &str = "https://rest.ensembl.org";

/// REST API release this client was written against
pub const DEFAULT_EXPECTED_REST_VERSION: &str = "15.2";

/// Default read timeout for data requests (5 minutes)
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Availability pings fail fast
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 2;

/// Largest id list the sequence endpoint accepts in one POST
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Total attempts for a rate-limited request, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Longest `Retry-After` the client is willing to wait for
pub const DEFAULT_MAX_RETRY_AFTER_SECS: u64 = 10;

/// Species searched when resolving a gene symbol
pub const DEFAULT_MODEL_ORGANISMS: &[&str] = &[
    "human",
    "mouse",
    "rat",
    "zebrafish",
    "chicken",
    "xenopus",
    "s_cerevisiae",
    "c_elegans",
    "d_melanogaster",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Primary REST domain (vertebrates)
    pub domain: String,

    /// Domain serving the non-vertebrate divisions
    pub genomes_domain: String,

    pub expected_rest_version: String,
    pub expected_genomes_rest_version: String,

    pub read_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub ping_timeout_secs: u64,

    pub max_batch_size: usize,

    /// Accessions enriched at the same time
    pub max_concurrency: usize,

    pub max_attempts: u32,
    pub max_retry_after_secs: u64,

    pub model_organisms: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            genomes_domain: DEFAULT_DOMAIN.to_string(),
            expected_rest_version: DEFAULT_EXPECTED_REST_VERSION.to_string(),
            expected_genomes_rest_version: DEFAULT_EXPECTED_REST_VERSION.to_string(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            ping_timeout_secs: DEFAULT_PING_TIMEOUT_SECS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_retry_after_secs: DEFAULT_MAX_RETRY_AFTER_SECS,
            model_organisms: DEFAULT_MODEL_ORGANISMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load from `GENOFETCH_*` environment variables over the defaults
    ///
    /// The genomes domain falls back to the primary domain when unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let domain = env_or("GENOFETCH_DOMAIN", defaults.domain);
        let genomes_domain = env_or("GENOFETCH_GENOMES_DOMAIN", domain.clone());

        Self {
            domain,
            genomes_domain,
            expected_rest_version: env_or(
                "GENOFETCH_EXPECTED_REST_VERSION",
                defaults.expected_rest_version,
            ),
            expected_genomes_rest_version: env_or(
                "GENOFETCH_EXPECTED_GENOMES_REST_VERSION",
                defaults.expected_genomes_rest_version,
            ),
            read_timeout_secs: env_or("GENOFETCH_READ_TIMEOUT_SECS", defaults.read_timeout_secs),
            connect_timeout_secs: env_or(
                "GENOFETCH_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            ping_timeout_secs: env_or("GENOFETCH_PING_TIMEOUT_SECS", defaults.ping_timeout_secs),
            max_batch_size: env_or("GENOFETCH_MAX_BATCH_SIZE", defaults.max_batch_size),
            max_concurrency: env_or("GENOFETCH_MAX_CONCURRENCY", defaults.max_concurrency),
            max_attempts: env_or("GENOFETCH_MAX_ATTEMPTS", defaults.max_attempts),
            max_retry_after_secs: env_or(
                "GENOFETCH_MAX_RETRY_AFTER_SECS",
                defaults.max_retry_after_secs,
            ),
            model_organisms: defaults.model_organisms,
        }
    }

    /// REST release expected from `domain`
    pub fn expected_version_for(&self, domain: &str) -> &str {
        if domain == self.genomes_domain && domain != self.domain {
            &self.expected_genomes_rest_version
        } else {
            &self.expected_rest_version
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("domain", &self.domain), ("genomes domain", &self.genomes_domain)] {
            if value.is_empty() {
                return Err(EnsemblError::config(format!("{} cannot be empty", name)));
            }
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(EnsemblError::config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, value
                )));
            }
        }

        if self.read_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(EnsemblError::config("Timeouts must be greater than 0"));
        }

        if self.ping_timeout_secs == 0 {
            return Err(EnsemblError::config("Ping timeout must be greater than 0"));
        }

        if self.max_batch_size == 0 {
            return Err(EnsemblError::config("Batch size must be greater than 0"));
        }

        if self.max_concurrency == 0 {
            return Err(EnsemblError::config("Concurrency must be greater than 0"));
        }

        if self.max_attempts == 0 {
            return Err(EnsemblError::config("At least one attempt is required"));
        }

        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    domain: Option<String>,
    genomes_domain: Option<String>,
    expected_rest_version: Option<String>,
    expected_genomes_rest_version: Option<String>,
    read_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    ping_timeout_secs: Option<u64>,
    max_batch_size: Option<usize>,
    max_concurrency: Option<usize>,
    max_attempts: Option<u32>,
    max_retry_after_secs: Option<u64>,
    model_organisms: Option<Vec<String>>,
}

impl ClientConfigBuilder {
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(trim_slash(domain.into()));
        self
    }

    pub fn genomes_domain(mut self, domain: impl Into<String>) -> Self {
        self.genomes_domain = Some(trim_slash(domain.into()));
        self
    }

    pub fn expected_rest_version(mut self, version: impl Into<String>) -> Self {
        self.expected_rest_version = Some(version.into());
        self
    }

    pub fn expected_genomes_rest_version(mut self, version: impl Into<String>) -> Self {
        self.expected_genomes_rest_version = Some(version.into());
        self
    }

    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    pub fn ping_timeout_secs(mut self, secs: u64) -> Self {
        self.ping_timeout_secs = Some(secs);
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = Some(size);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn max_retry_after_secs(mut self, secs: u64) -> Self {
        self.max_retry_after_secs = Some(secs);
        self
    }

    pub fn model_organisms(mut self, organisms: Vec<String>) -> Self {
        self.model_organisms = Some(organisms);
        self
    }

    pub fn build(self) -> ClientConfig {
        let default = ClientConfig::default();
        let domain = self.domain.unwrap_or(default.domain);

        ClientConfig {
            genomes_domain: self.genomes_domain.unwrap_or_else(|| domain.clone()),
            domain,
            expected_rest_version: self
                .expected_rest_version
                .unwrap_or(default.expected_rest_version),
            expected_genomes_rest_version: self
                .expected_genomes_rest_version
                .unwrap_or(default.expected_genomes_rest_version),
            read_timeout_secs: self.read_timeout_secs.unwrap_or(default.read_timeout_secs),
            connect_timeout_secs: self
                .connect_timeout_secs
                .unwrap_or(default.connect_timeout_secs),
            ping_timeout_secs: self.ping_timeout_secs.unwrap_or(default.ping_timeout_secs),
            max_batch_size: self.max_batch_size.unwrap_or(default.max_batch_size),
            max_concurrency: self.max_concurrency.unwrap_or(default.max_concurrency),
            max_attempts: self.max_attempts.unwrap_or(default.max_attempts),
            max_retry_after_secs: self
                .max_retry_after_secs
                .unwrap_or(default.max_retry_after_secs),
            model_organisms: self.model_organisms.unwrap_or(default.model_organisms),
        }
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.domain, DEFAULT_DOMAIN);
        assert_eq!(config.genomes_domain, DEFAULT_DOMAIN);
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.model_organisms.len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_defaults_genomes_domain_to_domain() {
        let config = ClientConfig::builder()
            .domain("http://localhost:8080/")
            .max_batch_size(10)
            .build();
        assert_eq!(config.domain, "http://localhost:8080");
        assert_eq!(config.genomes_domain, "http://localhost:8080");
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.read_timeout_secs, DEFAULT_READ_TIMEOUT_SECS);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::builder().domain("").build().validate().is_err());
        assert!(ClientConfig::builder()
            .domain("ftp://example.org")
            .build()
            .validate()
            .is_err());
        assert!(ClientConfig::builder().max_batch_size(0).build().validate().is_err());
        assert!(ClientConfig::builder().max_attempts(0).build().validate().is_err());
        assert!(ClientConfig::builder().ping_timeout_secs(0).build().validate().is_err());
    }

    #[test]
    fn test_expected_version_per_domain() {
        let config = ClientConfig::builder()
            .domain("https://rest.ensembl.org")
            .genomes_domain("https://rest.ensemblgenomes.org")
            .expected_genomes_rest_version("15.1")
            .build();
        assert_eq!(config.expected_version_for("https://rest.ensembl.org"), "15.2");
        assert_eq!(config.expected_version_for("https://rest.ensemblgenomes.org"), "15.1");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("GENOFETCH_DOMAIN", "http://example.com");
        std::env::set_var("GENOFETCH_MAX_BATCH_SIZE", "20");
        std::env::set_var("GENOFETCH_MAX_ATTEMPTS", "not-a-number");

        let config = ClientConfig::from_env();
        assert_eq!(config.domain, "http://example.com");
        assert_eq!(config.genomes_domain, "http://example.com");
        assert_eq!(config.max_batch_size, 20);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);

        std::env::remove_var("GENOFETCH_DOMAIN");
        std::env::remove_var("GENOFETCH_MAX_BATCH_SIZE");
        std::env::remove_var("GENOFETCH_MAX_ATTEMPTS");
    }
}
