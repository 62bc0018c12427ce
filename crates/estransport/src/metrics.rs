//! Metrics emitted through the `metrics` facade.
//!
//! - `estransport_requests_total{outcome}` - Counter of `perform` attempts
//! - `estransport_connection_failures_total` - Counter of failures recorded against connections
//! - `estransport_discovery_runs_total{outcome}` - Counter of discovery runs
//! - `estransport_pool_alive_connections` - Gauge of alive connections after the last transition
//!
//! Nothing is recorded unless the embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::sync::Once;

static DESCRIBE: Once = Once::new();

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    DESCRIBE.call_once(|| {
        describe_counter!("estransport_requests_total", "Total number of perform attempts");
        describe_counter!(
            "estransport_connection_failures_total",
            "Total number of transport failures recorded against connections"
        );
        describe_counter!("estransport_discovery_runs_total", "Total number of discovery runs");
        describe_gauge!(
            "estransport_pool_alive_connections",
            "Number of alive connections in the pool"
        );
    });
}

pub(crate) fn record_request(outcome: &'static str) {
    counter!("estransport_requests_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_connection_failure() {
    counter!("estransport_connection_failures_total").increment(1);
}

pub(crate) fn record_discovery(outcome: &'static str) {
    counter!("estransport_discovery_runs_total", "outcome" => outcome).increment(1);
}

#[allow(clippy::cast_precision_loss, reason = "pool sizes are far below f64 precision")]
pub(crate) fn set_alive_connections(alive: usize) {
    gauge!("estransport_pool_alive_connections").set(alive as f64);
}
