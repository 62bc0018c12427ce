//! Transport configuration.
//!
//! Every section deserializes with defaults, so a config file only needs the
//! fields it changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Upper bound for `resurrect.initial_timeout_secs` (one day).
pub const MAX_RESURRECT_TIMEOUT_SECS: u64 = 86_400;

/// Upper bound for `resurrect.factor_cutoff`.
pub const MAX_RESURRECT_FACTOR_CUTOFF: u32 = 16;

/// What `next()` does when every connection is dead and none has served its
/// resurrection backoff yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadConnectionPolicy {
    /// Hand out the longest-dead connection anyway
    #[default]
    Availability,
    /// Report no connection until a backoff elapses
    StrictBackoff,
}

/// Built-in selection strategies among alive connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    #[default]
    RoundRobin,
    Random,
}

/// Periodic node discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Run the background discovery loop
    pub enabled: bool,
    /// Seconds between discovery runs (default: 300 = 5 minutes)
    pub interval_secs: u64,
    /// Discover once immediately when the loop starts
    pub on_start: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self { enabled: false, interval_secs: 300, on_start: true }
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Resurrection backoff: `initial_timeout * 2^min(failures - 1, factor_cutoff)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResurrectConfig {
    /// Backoff after the first failure in seconds (default: 60)
    pub initial_timeout_secs: u64,
    /// Exponent cap; the longest backoff is `initial * 2^factor_cutoff` (default: 5)
    pub factor_cutoff: u32,
}

impl Default for ResurrectConfig {
    fn default() -> Self {
        Self { initial_timeout_secs: 60, factor_cutoff: 5 }
    }
}

impl ResurrectConfig {
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_secs(self.initial_timeout_secs)
    }
}

/// Configuration for the retry layer above `perform`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Turn every call into a single attempt
    pub disabled: bool,
    /// Maximum number of additional attempts after the first
    pub max_retries: u32,
    /// Response statuses that trigger another attempt
    pub retry_on_status: Vec<u16>,
    /// Retry requests that timed out (may duplicate non-idempotent work)
    pub retry_on_timeout: bool,
    /// Initial delay between attempts in milliseconds (0 = retry immediately)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            max_retries: 3,
            retry_on_status: vec![502, 503, 504],
            retry_on_timeout: false,
            base_delay_ms: 0,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// Delay before the given retry (1-based), doubling from `base_delay_ms`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let factor = 1_u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }
}

/// Configuration for the transport client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Seed endpoints; discovery reuses the scheme of the first one
    pub urls: Vec<String>,
    /// Basic auth username (ignored when `api_key` is set)
    pub username: Option<String>,
    pub password: Option<String>,
    /// Base64-encoded API key sent as `Authorization: ApiKey ...`
    pub api_key: Option<String>,
    pub user_agent: String,
    /// Per-request timeout enforced by the HTTP transport, in seconds
    pub request_timeout_secs: Option<u64>,
    pub discovery: DiscoveryConfig,
    pub resurrect: ResurrectConfig,
    pub dead_connection_policy: DeadConnectionPolicy,
    pub retry: RetryConfig,
    pub selector: SelectorKind,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            urls: vec![DEFAULT_URL.to_string()],
            username: None,
            password: None,
            api_key: None,
            user_agent: format!("estransport/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: None,
            discovery: DiscoveryConfig::default(),
            resurrect: ResurrectConfig::default(),
            dead_connection_policy: DeadConnectionPolicy::default(),
            retry: RetryConfig::default(),
            selector: SelectorKind::default(),
        }
    }
}

impl TransportConfig {
    /// Config with the given seed endpoints and defaults for everything else.
    pub fn with_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { urls: urls.into_iter().map(Into::into).collect(), ..Default::default() }
    }

    /// Parse and validate the seed endpoints.
    pub fn seed_urls(&self) -> Result<Vec<Url>, ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::NoSeedUrls);
        }
        self.urls.iter().map(|raw| parse_seed_url(raw)).collect()
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.seed_urls()?;

        if self.discovery.enabled && self.discovery.interval_secs == 0 {
            return Err(ConfigError::Validation {
                field: "discovery.interval_secs".to_string(),
                message: "must be greater than zero when discovery is enabled".to_string(),
            });
        }
        if !(1..=MAX_RESURRECT_TIMEOUT_SECS).contains(&self.resurrect.initial_timeout_secs) {
            return Err(ConfigError::Validation {
                field: "resurrect.initial_timeout_secs".to_string(),
                message: format!("must be between 1 and {MAX_RESURRECT_TIMEOUT_SECS}"),
            });
        }
        if self.resurrect.factor_cutoff > MAX_RESURRECT_FACTOR_CUTOFF {
            return Err(ConfigError::Validation {
                field: "resurrect.factor_cutoff".to_string(),
                message: format!("must not exceed {MAX_RESURRECT_FACTOR_CUTOFF}"),
            });
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::Validation {
                field: "retry.max_delay_ms".to_string(),
                message: "must not be lower than retry.base_delay_ms".to_string(),
            });
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::Validation {
                field: "password".to_string(),
                message: "set without a username".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_seed_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidUrl { url: raw.to_string(), message: e.to_string() })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            message: "missing host".to_string(),
        });
    }
    Ok(url)
}
