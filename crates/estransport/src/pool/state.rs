//! Lock-protected pool state and the selection algorithm.

use chrono::{TimeDelta, Utc};
use estransport_types::models::{ConnectionStatus, DeadConnectionPolicy, PoolStats};
use estransport_types::TransportError;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use crate::connection::{Connection, ConnectionHealth};
use crate::resurrect::ResurrectPolicy;
use crate::selector::Selector;

#[derive(Debug)]
struct PoolEntry {
    conn: Arc<Connection>,
    health: ConnectionHealth,
}

#[derive(Debug)]
pub(super) struct PoolState {
    entries: Vec<PoolEntry>,
    selector: Arc<dyn Selector>,
}

impl PoolState {
    pub(super) fn new(connections: Vec<Connection>, selector: Arc<dyn Selector>) -> Self {
        selector.reset();
        let entries = connections
            .into_iter()
            .map(|conn| PoolEntry { conn: Arc::new(conn), health: ConnectionHealth::default() })
            .collect();
        Self { entries, selector }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn alive_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.health.is_dead()).count()
    }

    pub(super) fn connections(&self) -> Vec<Arc<Connection>> {
        self.entries.iter().map(|e| Arc::clone(&e.conn)).collect()
    }

    pub(super) fn urls(&self) -> Vec<Url> {
        self.entries.iter().map(|e| e.conn.url().clone()).collect()
    }

    /// Entries are matched by identity: a connection handed out before a
    /// rebuild never matches an entry of the new set.
    fn position(&self, conn: &Arc<Connection>) -> Option<usize> {
        self.entries.iter().position(|e| Arc::ptr_eq(&e.conn, conn))
    }

    pub(super) fn health_of(&self, conn: &Arc<Connection>) -> Option<ConnectionHealth> {
        self.position(conn).map(|idx| self.entries[idx].health)
    }

    pub(super) fn health_mut(&mut self, conn: &Arc<Connection>) -> Option<&mut ConnectionHealth> {
        let idx = self.position(conn)?;
        Some(&mut self.entries[idx].health)
    }

    /// Return every dead connection whose backoff has elapsed at `now` to the
    /// alive set. Returns how many were resurrected.
    pub(super) fn resurrect_eligible(&mut self, now: Instant, resurrect: &ResurrectPolicy) -> usize {
        let mut resurrected = 0;
        for entry in &mut self.entries {
            if !resurrect.is_eligible(&entry.health, now) {
                continue;
            }
            entry.health.resurrect();
            resurrected += 1;
            tracing::info!(
                url = %entry.conn.url(),
                failures = entry.health.failures(),
                "Connection back in rotation after backoff"
            );
        }
        resurrected
    }

    /// Pick the connection for the next request.
    ///
    /// Callers run [`resurrect_eligible`](Self::resurrect_eligible) first, so
    /// every dead entry seen here is still backing off.
    ///
    /// 1. Alive connections exist: the selector chooses among them.
    /// 2. Otherwise, depending on `dead_policy`, the longest-dead connection
    ///    or no connection at all.
    ///
    /// Dead ties break by fewer failures, then insertion order.
    pub(super) fn select(
        &self,
        dead_policy: DeadConnectionPolicy,
    ) -> Result<Arc<Connection>, TransportError> {
        if self.entries.is_empty() {
            return Err(TransportError::NoConnectionAvailable);
        }

        let alive: Vec<&PoolEntry> = self.entries.iter().filter(|e| !e.health.is_dead()).collect();
        if !alive.is_empty() {
            let candidates: Vec<&Connection> = alive.iter().map(|e| e.conn.as_ref()).collect();
            let pick = self.selector.select(&candidates).min(alive.len() - 1);
            return Ok(Arc::clone(&alive[pick].conn));
        }

        match dead_policy {
            DeadConnectionPolicy::Availability => {
                let entry = self.oldest_dead().ok_or(TransportError::NoConnectionAvailable)?;
                tracing::debug!(
                    url = %entry.conn.url(),
                    failures = entry.health.failures(),
                    "No connection past its backoff, using longest-dead connection"
                );
                Ok(Arc::clone(&entry.conn))
            },
            DeadConnectionPolicy::StrictBackoff => {
                tracing::debug!(
                    dead = self.entries.len(),
                    "All connections are dead and backing off"
                );
                Err(TransportError::NoConnectionAvailable)
            },
        }
    }

    fn oldest_dead(&self) -> Option<&PoolEntry> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.health.is_dead())
            .min_by_key(|(idx, e)| (e.health.dead_since(), e.health.failures(), *idx))
            .map(|(_, e)| e)
    }

    pub(super) fn stats(&self, now: Instant, resurrect: &ResurrectPolicy) -> PoolStats {
        let wall_now = Utc::now();
        let connections = self
            .entries
            .iter()
            .map(|e| {
                let dead_since = e.health.dead_since().and_then(|since| {
                    let elapsed = TimeDelta::from_std(now.saturating_duration_since(since)).ok()?;
                    wall_now.checked_sub_signed(elapsed)
                });
                ConnectionStatus {
                    url: e.conn.url().to_string(),
                    id: e.conn.id().map(str::to_string),
                    name: e.conn.name().map(str::to_string),
                    roles: e.conn.roles().to_vec(),
                    is_dead: e.health.is_dead(),
                    failures: e.health.failures(),
                    dead_since,
                    resurrect_in_secs: resurrect.remaining(&e.health, now).map(|d| d.as_secs()),
                }
            })
            .collect();
        PoolStats::from_connections(connections)
    }
}
