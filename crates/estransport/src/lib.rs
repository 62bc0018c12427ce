#![doc = include_str!("../README.md")]
#![allow(
    clippy::significant_drop_tightening,
    reason = "pool guards are released explicitly before logging"
)]
#![allow(clippy::module_name_repetitions, reason = "ConnectionPool, StatusConnectionPool read better in full")]
// Test-only lints: allow panic!, unwrap, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::assertions_on_result_states
    )
)]

pub mod client;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod resurrect;
pub mod selector;
pub mod transport;

// Re-export commonly used types
pub use client::{Client, ClientBuilder, Request};
pub use connection::{Connection, ConnectionHealth};
pub use discovery::DiscoveryHandle;
pub use error::{Error, Result};
pub use pool::{ConnectionPool, PoolFactory, StatusConnectionPool};
pub use resurrect::ResurrectPolicy;
pub use selector::{selector_for, RandomSelector, RoundRobinSelector, Selector};
pub use transport::{HttpTransport, Transport};

pub use estransport_types::models::{DeadConnectionPolicy, PoolStats, SelectorKind, TransportConfig};
pub use estransport_types::{ConfigError, DiscoveryError, TransportError};
