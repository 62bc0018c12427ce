//! Environment-based configuration.

use estransport_types::models::TransportConfig;

pub const URL_ENV: &str = "ELASTICSEARCH_URL";
pub const API_KEY_ENV: &str = "ELASTICSEARCH_API_KEY";

/// Default config with seed URLs and API key taken from the environment.
///
/// `ELASTICSEARCH_URL` may hold several comma-separated endpoints. Empty or
/// invalid values are ignored with a warning.
pub fn from_env() -> TransportConfig {
    let urls = std::env::var(URL_ENV).ok();
    let api_key = std::env::var(API_KEY_ENV).ok();
    from_values(urls.as_deref(), api_key.as_deref())
}

fn from_values(urls: Option<&str>, api_key: Option<&str>) -> TransportConfig {
    let mut config = TransportConfig::default();

    if let Some(raw) = urls {
        let candidate = TransportConfig::with_urls(
            raw.split(',').map(str::trim).filter(|u| !u.is_empty()),
        );
        match candidate.seed_urls() {
            Ok(_) => {
                tracing::info!(urls = %raw, "Using seed URLs from {}", URL_ENV);
                config.urls = candidate.urls;
            },
            Err(e) => tracing::warn!("{} is invalid ({}), using defaults", URL_ENV, e),
        }
    }

    if let Some(key) = api_key.map(str::trim) {
        if key.is_empty() {
            tracing::warn!("{} is empty, ignoring", API_KEY_ENV);
        } else {
            config.api_key = Some(key.to_string());
        }
    }

    config
}
