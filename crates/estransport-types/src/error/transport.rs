//! Request-path errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to callers of `perform`.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum TransportError {
    /// The pool holds no connection that may be used for this attempt
    #[error("No connection available")]
    NoConnectionAvailable,

    /// The request/response exchange with a node failed
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The exchange with a node did not complete in time
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// The request could not be built (bad path, header, or URL)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl TransportError {
    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this error must be recorded against the connection that served it.
    ///
    /// Only failures of the exchange itself count; building the request or
    /// finding no connection says nothing about node health.
    pub fn marks_connection_dead(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::Timeout { .. })
    }
}
