//! Cluster node handles and their health state.
//!
//! A [`Connection`] is immutable once built: address plus whatever metadata
//! discovery reported. Its mutable [`ConnectionHealth`] lives next to it inside
//! the pool, so every transition happens under the pool's lock.

use estransport_types::models::NodeInfo;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Instant;
use url::Url;

/// A handle to one reachable cluster node.
#[derive(Debug, Clone)]
pub struct Connection {
    url: Url,
    id: Option<String>,
    name: Option<String>,
    roles: Vec<String>,
    attributes: Map<String, Value>,
}

impl Connection {
    /// Connection to a configured seed endpoint, without node metadata.
    pub fn new(url: Url) -> Self {
        Self { url, id: None, name: None, roles: Vec::new(), attributes: Map::new() }
    }

    /// Connection for a discovered node reachable at `url`.
    pub fn from_node(node: NodeInfo, url: Url) -> Self {
        Self {
            url,
            id: Some(node.id).filter(|id| !id.is_empty()),
            name: Some(node.name).filter(|name| !name.is_empty()),
            roles: node.roles,
            attributes: node.attributes,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.url, name),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Mutable health state of a connection.
///
/// Invariant: a dead connection always has a `dead_since` and at least one
/// failure. An alive one has no `dead_since`; it keeps its failure count after
/// a resurrection until the next success clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionHealth {
    is_dead: bool,
    dead_since: Option<Instant>,
    failures: u32,
}

impl ConnectionHealth {
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn dead_since(&self) -> Option<Instant> {
        self.dead_since
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Put a dead connection back into rotation without forgetting its
    /// failures, so a node that fails again backs off longer. No-op when alive.
    pub fn resurrect(&mut self) {
        self.is_dead = false;
        self.dead_since = None;
    }

    /// Clear all failure state. Idempotent.
    pub fn mark_alive(&mut self) {
        *self = Self::default();
    }

    /// Record a failure at `now`.
    ///
    /// Moving from alive to dead starts the dead period; failures while
    /// already dead only bump the counter so `dead_since` keeps pointing at
    /// the start of the outage. Returns true when this call moved the
    /// connection from alive to dead.
    pub fn mark_dead(&mut self, now: Instant) -> bool {
        self.failures = self.failures.saturating_add(1);
        if self.is_dead {
            false
        } else {
            self.is_dead = true;
            self.dead_since = Some(now);
            true
        }
    }
}
