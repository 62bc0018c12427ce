//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while validating a transport configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// No seed endpoint was configured
    #[error("No seed URLs configured")]
    NoSeedUrls,

    /// A seed endpoint is not a valid absolute http(s) URL
    #[error("Invalid URL {url:?}: {message}")]
    InvalidUrl {
        /// The offending value as configured
        url: String,
        /// Description of the parse failure
        message: String,
    },

    /// Config validation error (invalid values)
    #[error("Config validation error for {field}: {message}")]
    Validation {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}
