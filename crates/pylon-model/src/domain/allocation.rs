use serde::{Deserialize, Serialize};

use crate::{AllocationId, NodeId, ServerId};

/// A `(node, ip, port)` network binding.
///
/// An allocation can be assigned to at most one server; `server_id` is `None` while it is free.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub node_id: NodeId,
    pub ip: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<ServerId>,
}

impl Allocation {
    /// Returns `true` if no server is assigned to this allocation.
    pub fn is_unassigned(&self) -> bool {
        self.server_id.is_none()
    }

    /// Returns `true` if the allocation lives on `node` and is free.
    pub fn is_available_on(&self, node: NodeId) -> bool {
        self.node_id == node && self.is_unassigned()
    }
}
