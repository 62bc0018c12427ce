//! Selection strategies among eligible connections.
//!
//! The pool calls a selector while holding its lock, so implementations only
//! need interior state that is `Sync`; they never see a half-updated set.

use estransport_types::models::SelectorKind;
use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::connection::Connection;

/// Pluggable tie-break policy used when several connections are eligible.
pub trait Selector: Send + Sync + fmt::Debug {
    /// Return the index of the chosen connection. `candidates` is never empty.
    fn select(&self, candidates: &[&Connection]) -> usize;

    /// Forget rotation state; called when the pool is rebuilt.
    fn reset(&self) {}
}

/// Cycles evenly over the candidates, starting at the first one.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    cursor: AtomicUsize,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selector for RoundRobinSelector {
    fn select(&self, candidates: &[&Connection]) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len()
    }

    fn reset(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }
}

/// Picks uniformly at random.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn select(&self, candidates: &[&Connection]) -> usize {
        rand::thread_rng().gen_range(0..candidates.len())
    }
}

/// Build the selector for a configured strategy.
pub fn selector_for(kind: SelectorKind) -> Arc<dyn Selector> {
    match kind {
        SelectorKind::RoundRobin => Arc::new(RoundRobinSelector::new()),
        SelectorKind::Random => Arc::new(RandomSelector),
    }
}
