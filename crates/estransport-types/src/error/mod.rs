//! Typed error definitions for estransport.
//!
//! This module provides a structured error hierarchy with specific error types
//! for the request path, the discovery loop, and configuration. All errors are:
//!
//! - **Serializable** for diagnostics output via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for retry and failover logic via enum variants

mod config;
mod discovery;
mod transport;

pub use config::ConfigError;
pub use discovery::DiscoveryError;
pub use transport::TransportError;
