//! Allocation policy seams.
//!
//! The allocation core never talks to the registry or the orchestration
//! layer directly; whoever drives a decision injects these handles.

use crate::config::ProvisionConfig;
use crate::node::{Node, NodeState};

/// Answers the placement questions that depend on the surrounding
/// system rather than the snapshot itself.
pub trait AllocationPolicy {
    /// How many hosts to hold back as failure-recovery buffer.
    fn spare_count(&self) -> u32;

    /// May new tenant nodes (or returning non-active ones) be placed on
    /// this host? Drained or retiring hosts answer no.
    fn can_allocate_tenant_node_to(&self, host: &Node) -> bool;
}

/// Config-backed policy: spare count from [`ProvisionConfig`], and only
/// active hosts accept tenant nodes.
#[derive(Debug, Clone)]
pub struct StaticAllocationPolicy {
    spare_count: u32,
}

impl StaticAllocationPolicy {
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            spare_count: config.spare_count,
        }
    }
}

impl AllocationPolicy for StaticAllocationPolicy {
    fn spare_count(&self) -> u32 {
        self.spare_count
    }

    fn can_allocate_tenant_node_to(&self, host: &Node) -> bool {
        host.state == NodeState::Active
    }
}
