//! # estransport Types
//!
//! Core types, models, and error definitions for the estransport workspace.
//!
//! This crate provides the foundational type system:
//!
//! - **`error`** - Typed error hierarchy for transport, discovery, and configuration
//! - **`models`** - Node-info documents, transport configuration, pool snapshots
//!
//! ## Architecture Role
//!
//! `estransport-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!            estransport-types (this crate)
//!                    │
//!                    ▼
//!               estransport
//!                    │
//!                    ▼
//!             estransport-cli
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for config files and diagnostics
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ConfigError, DiscoveryError, TransportError};

// Re-export core model types
pub use models::{
    ConnectionStatus, DeadConnectionPolicy, DiscoveryConfig, NodeHttp, NodeInfo,
    NodesInfoResponse, PoolStats, ResurrectConfig, RetryConfig, SelectorKind, TransportConfig,
};
