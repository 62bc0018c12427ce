//! Domain models shared across the workspace.

pub mod config;
pub mod node;
pub mod stats;

pub use config::{
    DeadConnectionPolicy, DiscoveryConfig, ResurrectConfig, RetryConfig, SelectorKind,
    TransportConfig, DEFAULT_URL,
};
pub use node::{roles, NodeHttp, NodeInfo, NodesInfoResponse};
pub use stats::{ConnectionStatus, PoolStats};
