//! Host capacity accounting and spare-host selection.

use std::collections::HashSet;

use tracing::debug;

use nodegrid_core::{
    HostName, HostResourcesCalculator, Node, NodePool, NodeState, Resources,
};

/// Answers how much headroom a host has left and which hosts to hold
/// back as failure-recovery buffer. Pure functions of the snapshot.
pub struct HostCapacity<'a> {
    pool: &'a NodePool,
    calculator: &'a dyn HostResourcesCalculator,
}

impl<'a> HostCapacity<'a> {
    pub fn new(pool: &'a NodePool, calculator: &'a dyn HostResourcesCalculator) -> Self {
        Self { pool, calculator }
    }

    /// The host's effective total minus its children's vectors.
    ///
    /// With `include_retired_children = false`, retired children count as
    /// already free — they are expected to vacate. Only host-type nodes
    /// have free capacity; everything else reports zero.
    pub fn free_capacity_of(&self, host: &Node, include_retired_children: bool) -> Resources {
        if !host.is_host() {
            return Resources::default();
        }
        let mut used = Resources::default();
        for child in self.pool.children_of(&host.hostname).iter() {
            if !include_retired_children && child.is_retired() {
                continue;
            }
            used = used.plus(&child.resources);
        }
        self.calculator.effective_resources_of(host).minus(&used)
    }

    /// Can `host` fit one more child of the requested vector?
    pub fn has_capacity(&self, host: &Node, requested: &Resources) -> bool {
        self.free_capacity_of(host, false).satisfies(requested)
    }

    /// Pick `spare_count` hosts to reserve as failure buffer.
    ///
    /// Active hosts with the most free capacity are chosen, so reserving
    /// them removes the least usable capacity from the pool while keeping
    /// the most room for emergency replacement. Ties break by hostname;
    /// if fewer hosts exist than asked for, all are reserved.
    pub fn find_spare_hosts(&self, spare_count: usize) -> HashSet<HostName> {
        let mut hosts: Vec<&Node> = self
            .pool
            .nodes()
            .filter(|n| n.is_host() && n.state == NodeState::Active)
            .collect();

        hosts.sort_by(|a, b| {
            let free_a = self.free_capacity_of(a, false);
            let free_b = self.free_capacity_of(b, false);
            free_b
                .capacity_cmp(&free_a)
                .then_with(|| a.hostname.cmp(&b.hostname))
        });

        let spares: HashSet<HostName> = hosts
            .into_iter()
            .take(spare_count)
            .map(|n| n.hostname.clone())
            .collect();
        debug!(wanted = spare_count, reserved = spares.len(), "selected spare hosts");
        spares
    }
}
