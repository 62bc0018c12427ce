//! Node-info parsing and publish-address mapping.

use estransport_types::models::{NodeInfo, NodesInfoResponse};
use estransport_types::DiscoveryError;
use url::Url;

use crate::connection::Connection;

/// Decode a node-info document into a node list ordered by node ID.
pub fn parse_nodes_info(body: &[u8]) -> Result<Vec<NodeInfo>, DiscoveryError> {
    let response: NodesInfoResponse = serde_json::from_slice(body)
        .map_err(|e| DiscoveryError::Parse { message: e.to_string() })?;
    Ok(response.into_nodes())
}

/// Split an HTTP publish address into host and port.
///
/// Accepted shapes: `host:port`, `hostname/ip:port` (hostname is used) and
/// bracketed IPv6 such as `[::1]:9200`. The port is the text after the last
/// `:`.
pub fn split_publish_address(address: &str) -> Option<(&str, &str)> {
    let (host_part, rest) = match address.split_once('/') {
        Some((hostname, ip_port)) => (hostname, ip_port),
        None => (address, address),
    };
    let (_, port) = rest.rsplit_once(':')?;

    let host = if host_part.starts_with('[') {
        let end = host_part.find(']')?;
        &host_part[..=end]
    } else {
        host_part.split(':').next().unwrap_or_default()
    };

    if host.is_empty() || port.is_empty() {
        return None;
    }
    Some((host, port))
}

/// Request URL for `node`, using the scheme of the seed endpoints.
pub fn node_url(node: &NodeInfo, scheme: &str) -> Result<Url, DiscoveryError> {
    let invalid = || DiscoveryError::InvalidAddress {
        node: node.id.clone(),
        address: node.publish_address().unwrap_or_default().to_string(),
    };

    let address = node.publish_address().ok_or_else(invalid)?;
    let (host, port) = split_publish_address(address).ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;

    Url::parse(&format!("{scheme}://{host}:{port}")).map_err(|_| invalid())
}

/// Connections for every node that may receive client requests.
///
/// Nodes lacking the data or ingest role and nodes without a usable HTTP
/// address are skipped and logged.
pub fn routable_connections(nodes: Vec<NodeInfo>, scheme: &str) -> Vec<Connection> {
    let mut connections = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !node.is_routable() {
            tracing::debug!(
                node = %node.id,
                name = %node.name,
                roles = ?node.roles,
                "[SKIP] Node is not both data and ingest"
            );
            continue;
        }
        match node_url(&node, scheme) {
            Ok(url) => connections.push(Connection::from_node(node, url)),
            Err(err) => tracing::warn!(node = %node.id, error = %err, "[SKIP] Unusable publish address"),
        }
    }
    connections
}
