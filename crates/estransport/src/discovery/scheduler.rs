//! Periodic discovery task.

use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::Client;

/// Handle to a running discovery loop.
///
/// The loop holds only a weak reference to the client and ends on its own
/// once the client is dropped.
#[derive(Debug)]
pub struct DiscoveryHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DiscoveryHandle {
    /// Signal the loop to stop. A run already in progress completes first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            tracing::warn!("[Discovery] Task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the discovery loop on the current runtime.
///
/// The next tick is scheduled after each run whatever its outcome.
pub(crate) fn spawn(client: Weak<Client>, interval: Duration, on_start: bool) -> DiscoveryHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "[Discovery] Loop started");

        if on_start && !run_once(&client).await {
            return;
        }

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {
                    if !run_once(&client).await {
                        break;
                    }
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("[Discovery] Loop shutting down");
                    break;
                }
            }
        }
    });

    DiscoveryHandle { shutdown_tx, task }
}

/// One discovery run. Returns `false` once the client is gone.
async fn run_once(client: &Weak<Client>) -> bool {
    let Some(client) = client.upgrade() else {
        tracing::debug!("[Discovery] Client dropped, stopping loop");
        return false;
    };
    // Errors are logged by `discover_nodes`; the loop keeps its schedule.
    let _ = client.discover_nodes().await;
    true
}
