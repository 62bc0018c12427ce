//! Resurrection backoff for dead connections.
//!
//! There is no background task: the pool asks the policy on every `next()`
//! and returns eligible dead connections to rotation. A connection that keeps failing waits
//! twice as long each time, up to `initial * 2^factor_cutoff`.

use estransport_types::models::ResurrectConfig;
use std::time::{Duration, Instant};

use crate::connection::ConnectionHealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResurrectPolicy {
    initial_timeout: Duration,
    factor_cutoff: u32,
}

impl Default for ResurrectPolicy {
    fn default() -> Self {
        Self::from_config(&ResurrectConfig::default())
    }
}

impl ResurrectPolicy {
    pub fn new(initial_timeout: Duration, factor_cutoff: u32) -> Self {
        Self { initial_timeout, factor_cutoff }
    }

    pub fn from_config(config: &ResurrectConfig) -> Self {
        Self::new(config.initial_timeout(), config.factor_cutoff)
    }

    /// Longest backoff this policy ever produces.
    pub fn max_timeout(&self) -> Duration {
        self.backoff(self.factor_cutoff.saturating_add(1))
    }

    /// Time a connection with `failures` consecutive failures stays out of rotation.
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(self.factor_cutoff).min(31);
        self.initial_timeout.saturating_mul(1_u32 << exponent)
    }

    /// When the backoff of a dead connection runs out.
    ///
    /// `None` for alive connections and for deadlines beyond what `Instant`
    /// can represent; such a connection never becomes eligible.
    pub fn deadline(&self, health: &ConnectionHealth) -> Option<Instant> {
        let dead_since = health.dead_since()?;
        dead_since.checked_add(self.backoff(health.failures()))
    }

    /// True once `now` has reached the connection's resurrection deadline.
    pub fn is_eligible(&self, health: &ConnectionHealth, now: Instant) -> bool {
        self.deadline(health).is_some_and(|deadline| now >= deadline)
    }

    /// Time left until resurrection, zero when already eligible.
    /// `Duration::MAX` when the deadline is out of range.
    pub fn remaining(&self, health: &ConnectionHealth, now: Instant) -> Option<Duration> {
        health.dead_since()?;
        Some(
            self.deadline(health)
                .map_or(Duration::MAX, |deadline| deadline.saturating_duration_since(now)),
        )
    }
}
