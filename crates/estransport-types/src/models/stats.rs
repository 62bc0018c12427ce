//! Point-in-time snapshots of pool state for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health view of a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub url: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub is_dead: bool,
    /// Consecutive failures since the last success
    pub failures: u32,
    pub dead_since: Option<DateTime<Utc>>,
    /// Seconds until the resurrection backoff elapses (0 when already eligible)
    pub resurrect_in_secs: Option<u64>,
}

/// Snapshot of a whole pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: usize,
    pub alive: usize,
    pub dead: usize,
    pub connections: Vec<ConnectionStatus>,
}

impl PoolStats {
    pub fn from_connections(connections: Vec<ConnectionStatus>) -> Self {
        let dead = connections.iter().filter(|c| c.is_dead).count();
        Self { total: connections.len(), alive: connections.len() - dead, dead, connections }
    }
}
