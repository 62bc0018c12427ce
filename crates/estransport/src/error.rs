//! Unified error type for estransport.

use estransport_types::{ConfigError, TransportError};
use thiserror::Error;

/// Error returned by client construction and request building.
///
/// Request-path calls return [`TransportError`] and discovery returns
/// [`DiscoveryError`](estransport_types::DiscoveryError) directly; this type
/// covers construction and request building.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Credentials or user agent are not valid header values.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for estransport operations.
pub type Result<T> = std::result::Result<T, Error>;
