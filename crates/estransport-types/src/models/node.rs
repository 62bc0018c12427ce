//! Node-info document returned by `GET /_nodes/http`.
//!
//! Only the fields the transport routes on are modelled; everything else in
//! the document is ignored during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known node role names.
pub mod roles {
    pub const DATA: &str = "data";
    pub const INGEST: &str = "ingest";
    pub const MASTER: &str = "master";
    /// Prefix shared by data tier roles (`data_hot`, `data_content`, ...)
    pub const DATA_TIER_PREFIX: &str = "data_";
}

/// Envelope of the node-info response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesInfoResponse {
    /// Nodes keyed by cluster-assigned node ID
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeInfo>,
}

impl NodesInfoResponse {
    /// Flatten the map into a list, copying each key into [`NodeInfo::id`].
    ///
    /// Order follows the node IDs, so repeated parses of the same document
    /// produce the same connection order.
    pub fn into_nodes(self) -> Vec<NodeInfo> {
        self.nodes
            .into_iter()
            .map(|(id, mut node)| {
                node.id = id;
                node
            })
            .collect()
    }
}

/// HTTP section of a node entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHttp {
    /// `host:port` or `hostname/ip:port`
    #[serde(default)]
    pub publish_address: String,
}

/// A single node as reported by the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Filled in from the map key by [`NodesInfoResponse::into_nodes`]
    #[serde(default, skip_deserializing)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Absent when the node has HTTP disabled
    #[serde(default)]
    pub http: Option<NodeHttp>,
}

impl NodeInfo {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True for the generic `data` role and every data tier role.
    pub fn is_data(&self) -> bool {
        self.roles.iter().any(|r| r == roles::DATA || r.starts_with(roles::DATA_TIER_PREFIX))
    }

    pub fn is_ingest(&self) -> bool {
        self.has_role(roles::INGEST)
    }

    /// Client requests are only routed to nodes that both hold data and run
    /// ingest pipelines; master-only and coordinating-only nodes are skipped.
    pub fn is_routable(&self) -> bool {
        self.is_data() && self.is_ingest()
    }

    /// The advertised HTTP publish address, if any.
    pub fn publish_address(&self) -> Option<&str> {
        self.http.as_ref().map(|h| h.publish_address.as_str()).filter(|a| !a.is_empty())
    }
}
