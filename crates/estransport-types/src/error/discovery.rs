//! Node discovery errors.
//!
//! These never reach in-flight request callers: the discovery loop logs them
//! and keeps the current pool.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TransportError;

/// Errors that can occur while refreshing the node list.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum DiscoveryError {
    /// The node-info request did not produce a response
    #[error("discovery: get nodes: {message}")]
    Fetch { message: String },

    /// The cluster answered the node-info request with a non-2xx status
    #[error("discovery: server error: {status}: {body}")]
    Server { status: u16, body: String },

    /// The node-info document could not be decoded
    #[error("discovery: parse nodes info: {message}")]
    Parse { message: String },

    /// A node advertised an HTTP publish address that does not form a URL
    #[error("discovery: node {node} has invalid publish address {address:?}")]
    InvalidAddress { node: String, address: String },

    /// No node in the response qualified for routing; the pool is kept as is
    #[error("discovery: none of {total} nodes is routable")]
    NoRoutableNodes { total: usize },
}

impl From<TransportError> for DiscoveryError {
    fn from(err: TransportError) -> Self {
        Self::Fetch { message: err.to_string() }
    }
}
