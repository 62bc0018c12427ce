//! Connection pool with health tracking and lazy resurrection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StatusConnectionPool                                         │
//! │  └── state: Mutex<PoolState>                                  │
//! │      ├── entries: Vec<(Arc<Connection>, ConnectionHealth)>    │
//! │      └── selector: Arc<dyn Selector>                          │
//! │  ├── resurrect: ResurrectPolicy                               │
//! │  └── dead_policy: DeadConnectionPolicy                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Alive and dead subsets are derived from each entry's health on every call,
//! never stored separately. All reads and transitions take the one mutex and
//! none of them performs I/O while holding it.

mod state;

#[cfg(test)]
mod tests;

use estransport_types::models::{DeadConnectionPolicy, PoolStats};
use estransport_types::TransportError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::connection::{Connection, ConnectionHealth};
use crate::resurrect::ResurrectPolicy;
use crate::selector::{RoundRobinSelector, Selector};
use state::PoolState;

/// Contract between the client façade and a pool implementation.
pub trait ConnectionPool: Send + Sync + fmt::Debug {
    /// Connection to use for the upcoming request.
    fn next(&self) -> Result<Arc<Connection>, TransportError>;

    /// Report that a request against `conn` succeeded.
    fn on_success(&self, conn: &Arc<Connection>);

    /// Report that a request against `conn` failed at the transport level.
    fn on_failure(&self, conn: &Arc<Connection>);

    /// Replace the whole connection set and reset selection state in one step.
    fn rebuild(&self, connections: Vec<Connection>, selector: Arc<dyn Selector>);

    /// Addresses of every connection currently in the pool.
    fn urls(&self) -> Vec<Url>;

    fn stats(&self) -> PoolStats;
}

/// Custom pool construction, resolved once when the client is built.
pub type PoolFactory =
    Arc<dyn Fn(Vec<Connection>, Arc<dyn Selector>) -> Arc<dyn ConnectionPool> + Send + Sync>;

/// Default pool: prefers alive connections, brings dead ones back once their
/// backoff elapses, degrades to the longest-dead one.
pub struct StatusConnectionPool {
    state: Mutex<PoolState>,
    resurrect: ResurrectPolicy,
    dead_policy: DeadConnectionPolicy,
}

impl StatusConnectionPool {
    pub fn new(connections: Vec<Connection>, selector: Arc<dyn Selector>) -> Self {
        Self {
            state: Mutex::new(PoolState::new(connections, selector)),
            resurrect: ResurrectPolicy::default(),
            dead_policy: DeadConnectionPolicy::default(),
        }
    }

    /// Pool over `connections` with round-robin selection.
    pub fn with_round_robin(connections: Vec<Connection>) -> Self {
        Self::new(connections, Arc::new(RoundRobinSelector::new()))
    }

    #[must_use]
    pub fn with_resurrect_policy(mut self, policy: ResurrectPolicy) -> Self {
        self.resurrect = policy;
        self
    }

    #[must_use]
    pub fn with_dead_connection_policy(mut self, policy: DeadConnectionPolicy) -> Self {
        self.dead_policy = policy;
        self
    }

    pub fn resurrect_policy(&self) -> &ResurrectPolicy {
        &self.resurrect
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.state.lock().connections()
    }

    /// Health of `conn`, or `None` if it is not (or no longer) in this pool.
    pub fn health_of(&self, conn: &Arc<Connection>) -> Option<ConnectionHealth> {
        self.state.lock().health_of(conn)
    }

    /// [`ConnectionPool::next`] evaluated at an explicit instant.
    ///
    /// Dead connections whose backoff has elapsed rejoin the alive set before
    /// the choice is made.
    pub fn next_at(&self, now: Instant) -> Result<Arc<Connection>, TransportError> {
        let mut state = self.state.lock();
        let resurrected = state.resurrect_eligible(now, &self.resurrect);
        let picked = state.select(self.dead_policy);
        let alive = state.alive_count();
        drop(state);

        if resurrected > 0 {
            crate::metrics::set_alive_connections(alive);
        }
        picked
    }

    /// [`ConnectionPool::on_failure`] recorded at an explicit instant.
    pub fn on_failure_at(&self, conn: &Arc<Connection>, now: Instant) {
        let mut state = self.state.lock();
        let Some(health) = state.health_mut(conn) else {
            tracing::debug!(url = %conn.url(), "Ignoring failure for connection no longer in pool");
            return;
        };

        let became_dead = health.mark_dead(now);
        let failures = health.failures();
        let alive = state.alive_count();
        drop(state);

        crate::metrics::record_connection_failure();
        crate::metrics::set_alive_connections(alive);

        if became_dead {
            tracing::warn!(
                url = %conn.url(),
                backoff_secs = self.resurrect.backoff(failures).as_secs(),
                alive,
                "Connection marked dead"
            );
        } else {
            tracing::debug!(
                url = %conn.url(),
                failures,
                backoff_secs = self.resurrect.backoff(failures).as_secs(),
                "Dead connection failed again"
            );
        }
    }

    /// [`ConnectionPool::stats`] evaluated at an explicit instant.
    pub fn stats_at(&self, now: Instant) -> PoolStats {
        self.state.lock().stats(now, &self.resurrect)
    }
}

impl ConnectionPool for StatusConnectionPool {
    fn next(&self) -> Result<Arc<Connection>, TransportError> {
        self.next_at(Instant::now())
    }

    fn on_success(&self, conn: &Arc<Connection>) {
        let mut state = self.state.lock();
        let Some(health) = state.health_mut(conn) else {
            tracing::debug!(url = %conn.url(), "Ignoring success for connection no longer in pool");
            return;
        };

        let was_dead = health.is_dead();
        health.mark_alive();
        let alive = state.alive_count();
        drop(state);

        if was_dead {
            crate::metrics::set_alive_connections(alive);
            tracing::info!(url = %conn.url(), alive, "Connection resurrected");
        }
    }

    fn on_failure(&self, conn: &Arc<Connection>) {
        self.on_failure_at(conn, Instant::now());
    }

    fn rebuild(&self, connections: Vec<Connection>, selector: Arc<dyn Selector>) {
        let count = connections.len();
        {
            let mut state = self.state.lock();
            *state = PoolState::new(connections, selector);
        }

        crate::metrics::set_alive_connections(count);
        tracing::info!(connections = count, "Connection pool rebuilt");
    }

    fn urls(&self) -> Vec<Url> {
        self.state.lock().urls()
    }

    fn stats(&self) -> PoolStats {
        self.stats_at(Instant::now())
    }
}

impl fmt::Debug for StatusConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("StatusConnectionPool")
            .field("connections", &state.len())
            .field("alive", &state.alive_count())
            .field("resurrect", &self.resurrect)
            .field("dead_policy", &self.dead_policy)
            .finish()
    }
}
