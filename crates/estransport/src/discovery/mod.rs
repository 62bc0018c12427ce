//! Cluster node discovery.
//!
//! A discovery run fetches `GET /_nodes/http` through the client's own
//! [`perform`](Client::perform) path, keeps the nodes that are both data and
//! ingest capable, and rebuilds the pool with them. Any failure leaves the
//! current pool untouched.

mod nodes;
mod scheduler;

pub use nodes::{node_url, parse_nodes_info, routable_connections, split_publish_address};
pub use scheduler::DiscoveryHandle;
pub(crate) use scheduler::spawn;

use estransport_types::DiscoveryError;

use crate::client::{Client, Request};

/// Node-info endpoint restricted to the HTTP section.
pub const NODES_HTTP_PATH: &str = "/_nodes/http";

impl Client {
    /// Refresh the connection set from the cluster's node list.
    ///
    /// Returns the number of connections in the rebuilt pool. Safe to call at
    /// any time, including while the scheduled loop is running.
    pub async fn discover_nodes(&self) -> Result<usize, DiscoveryError> {
        match self.fetch_routable().await {
            Ok(connections) => {
                let count = connections.len();
                self.pool.rebuild(connections, std::sync::Arc::clone(&self.selector));
                crate::metrics::record_discovery("success");
                tracing::info!(connections = count, "Discovery rebuilt connection pool");
                Ok(count)
            },
            Err(err) => {
                crate::metrics::record_discovery("error");
                tracing::warn!(error = %err, "Discovery failed, keeping current pool");
                Err(err)
            },
        }
    }

    async fn fetch_routable(&self) -> Result<Vec<crate::connection::Connection>, DiscoveryError> {
        let response = self.perform(&Request::get(NODES_HTTP_PATH)).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| DiscoveryError::Fetch { message: e.to_string() })?;

        if !status.is_success() {
            return Err(DiscoveryError::Server {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let nodes = parse_nodes_info(&body)?;
        let total = nodes.len();
        let connections = routable_connections(nodes, &self.scheme);
        tracing::debug!(total, routable = connections.len(), "Parsed node list");

        if connections.is_empty() {
            return Err(DiscoveryError::NoRoutableNodes { total });
        }
        Ok(connections)
    }
}
