//! Allocation requests.

use serde::{Deserialize, Serialize};

use crate::node::NodeType;
use crate::resources::Resources;

/// What one allocation decision is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    /// N nodes of an explicit resource vector. New virtual nodes may be
    /// carved out of hosts with headroom when too few exist.
    Count { count: u32, resources: Resources },
    /// Whatever nodes of the given type exist. Used for node types the
    /// platform manages as fixed inventory; never carves, never resizes.
    Type { node_type: NodeType },
}

impl NodeSpec {
    pub fn count(count: u32, resources: Resources) -> Self {
        NodeSpec::Count { count, resources }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeSpec::Count { .. } => NodeType::Tenant,
            NodeSpec::Type { node_type } => *node_type,
        }
    }

    /// The per-node resource vector, present only for count specs.
    pub fn resources(&self) -> Option<&Resources> {
        match self {
            NodeSpec::Count { resources, .. } => Some(resources),
            NodeSpec::Type { .. } => None,
        }
    }

    pub fn is_count_spec(&self) -> bool {
        matches!(self, NodeSpec::Count { .. })
    }

    /// Is `count` allocated nodes enough to satisfy this request?
    pub fn fulfilled_by(&self, count: u32) -> bool {
        match self {
            NodeSpec::Count { count: wanted, .. } => count >= *wanted,
            // A type spec takes whatever inventory exists.
            NodeSpec::Type { .. } => true,
        }
    }

    /// May an existing node be resized in place instead of replaced?
    ///
    /// Never while changing topology or shrinking the cluster; never while
    /// growing the cluster and shrinking per-node resources at the same
    /// time; otherwise only if the parent's headroom plus the node's own
    /// vector covers the requested vector.
    pub fn can_resize(
        &self,
        current: &Resources,
        headroom: &Resources,
        topology_changed: bool,
        current_cluster_size: u32,
    ) -> bool {
        match self {
            NodeSpec::Type { .. } => false,
            NodeSpec::Count { count, resources } => {
                if topology_changed || *count < current_cluster_size {
                    return false;
                }
                if *count > current_cluster_size && !resources.satisfies(current) {
                    return false;
                }
                headroom.plus(current).satisfies(resources)
            }
        }
    }
}
