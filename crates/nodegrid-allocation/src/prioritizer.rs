//! Candidate collection and prioritization for one allocation decision.
//!
//! A `NodePrioritizer` is a single-use computation object: construct it
//! against a locked pool snapshot, call any subset of the `add_*`
//! collection methods, then call [`NodePrioritizer::prioritize`] once
//! and discard it. It only ever computes a proposal — nothing in the
//! registry is touched.

use std::collections::HashSet;

use tracing::{debug, info};

use nodegrid_core::{
    AllocationPolicy, ApplicationId, ClusterSpec, HostName, HostResourcesCalculator, Node,
    NodePool, NodeSpec, NodeState, NodeType, Resources,
};

use crate::candidate::NodeCandidate;
use crate::capacity::HostCapacity;
use crate::error::{AllocationError, AllocationResult};
use crate::switches;

/// One allocation decision's request.
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub application: ApplicationId,
    pub cluster: ClusterSpec,
    pub spec: NodeSpec,
    /// Replica groups the cluster should end up with.
    pub wanted_groups: u32,
    /// When set, a host may only carry one tenant's nodes and in-place
    /// resizing is disabled.
    pub allocate_fully: bool,
}

/// Collects candidate nodes from the snapshot and ranks them.
pub struct NodePrioritizer<'a> {
    pool: &'a NodePool,
    capacity: HostCapacity<'a>,
    policy: &'a dyn AllocationPolicy,
    request: AllocationRequest,
    spare_hosts: HashSet<HostName>,
    is_topology_change: bool,
    current_cluster_size: u32,
    is_replacement: bool,
    candidates: Vec<NodeCandidate<'a>>,
}

impl std::fmt::Debug for NodePrioritizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodePrioritizer")
            .field("request", &self.request)
            .field("spare_hosts", &self.spare_hosts)
            .field("is_topology_change", &self.is_topology_change)
            .field("current_cluster_size", &self.current_cluster_size)
            .field("is_replacement", &self.is_replacement)
            .field("candidates_len", &self.candidates.len())
            .finish()
    }
}

impl<'a> NodePrioritizer<'a> {
    pub fn new(
        pool: &'a NodePool,
        request: AllocationRequest,
        policy: &'a dyn AllocationPolicy,
        calculator: &'a dyn HostResourcesCalculator,
    ) -> AllocationResult<Self> {
        if request.wanted_groups == 0 {
            return Err(AllocationError::InvalidRequest(
                "wanted_groups must be at least 1".to_string(),
            ));
        }
        if let NodeSpec::Count { count: 0, .. } = request.spec {
            return Err(AllocationError::InvalidRequest(
                "count spec must request at least one node".to_string(),
            ));
        }

        let capacity = HostCapacity::new(pool, calculator);
        let spare_hosts = capacity.find_spare_hosts(policy.spare_count() as usize);

        let nodes_in_cluster = pool
            .view()
            .owned_by(&request.application)
            .of_cluster_type(request.cluster.cluster_type)
            .in_cluster(&request.cluster.id);
        let active_non_retired = nodes_in_cluster
            .clone()
            .not_retired()
            .in_state(NodeState::Active);

        let current_groups: HashSet<u32> = active_non_retired
            .iter()
            .filter_map(|n| n.allocation.as_ref().and_then(|a| a.membership.group))
            .collect();
        let is_topology_change = current_groups.len() as u32 != request.wanted_groups;

        let current_cluster_size = active_non_retired
            .iter()
            .filter(|n| {
                n.allocation
                    .as_ref()
                    .is_some_and(|a| a.membership.group == request.cluster.group)
            })
            .count() as u32;

        let failed = nodes_in_cluster
            .clone()
            .in_state(NodeState::Failed)
            .len() as u32;
        let total = nodes_in_cluster.len() as u32;
        let is_replacement = failed > 0 && request.spec.fulfilled_by(total - failed);

        debug!(
            application = %request.application,
            cluster = %request.cluster.id,
            topology_change = is_topology_change,
            current_cluster_size,
            replacement = is_replacement,
            spares = spare_hosts.len(),
            "built node prioritizer"
        );

        Ok(Self {
            pool,
            capacity,
            policy,
            request,
            spare_hosts,
            is_topology_change,
            current_cluster_size,
            is_replacement,
            candidates: Vec::new(),
        })
    }

    /// Whether this decision exists to replace failed nodes rather than
    /// to grow the cluster.
    pub fn is_replacement(&self) -> bool {
        self.is_replacement
    }

    /// Whether the wanted group count differs from the cluster's current
    /// group topology.
    pub fn is_topology_change(&self) -> bool {
        self.is_topology_change
    }

    /// Active, non-retired nodes already in the requested group.
    pub fn current_cluster_size(&self) -> u32 {
        self.current_cluster_size
    }

    /// The resource vector new children are carved with.
    ///
    /// Fixed-flavor requests carry no such vector; asking for it is a
    /// caller bug surfaced as [`AllocationError::NotCountSpec`].
    pub fn carve_resources(&self) -> AllocationResult<&Resources> {
        self.request
            .spec
            .resources()
            .ok_or(AllocationError::NotCountSpec)
    }

    /// Add nodes previously reserved to this application, left over from
    /// an earlier downsize. Spare-violating surplus is only admitted when
    /// replacing failures.
    pub fn add_surplus_nodes(&mut self, surplus: impl IntoIterator<Item = &'a Node>) {
        for node in surplus {
            let candidate = self.candidate_from(node, true);
            if candidate.violates_spares && !self.is_replacement {
                debug!(node = %node.hostname, "surplus node would violate spares, skipped");
                continue;
            }
            self.candidates.push(candidate);
        }
    }

    /// Add existing nodes allocated to the application.
    ///
    /// Non-active nodes are only re-offered while their parent host still
    /// accepts tenant allocations; a draining host keeps its inactive
    /// children out of the running.
    pub fn add_application_nodes(&mut self) {
        let owned = self
            .pool
            .view()
            .of_type(self.request.spec.node_type())
            .in_states(&[NodeState::Active, NodeState::Inactive, NodeState::Reserved])
            .owned_by(&self.request.application);

        for node in owned.iter() {
            if node.state != NodeState::Active && !self.can_still_allocate_to_parent(node) {
                debug!(node = %node.hostname, "parent no longer accepts tenant nodes, skipped");
                continue;
            }
            let candidate = self.candidate_from(node, false);
            self.candidates.push(candidate);
        }
    }

    /// Add provisioned-but-unallocated nodes in state ready.
    pub fn add_ready_nodes(&mut self) {
        let ready = self
            .pool
            .view()
            .of_type(self.request.spec.node_type())
            .in_state(NodeState::Ready);

        for node in ready.iter() {
            let candidate = self.candidate_from(node, false);
            if candidate.violates_spares && !self.is_replacement {
                debug!(node = %node.hostname, "ready node sits on a spare host, skipped");
                continue;
            }
            self.candidates.push(candidate);
        }
    }

    /// Propose one new child on every host with room for the requested
    /// vector. No-op unless the request is a count spec.
    pub fn add_new_child_nodes(&mut self) {
        let Some(requested) = self.request.spec.resources().copied() else {
            return;
        };

        let mut hosts: Vec<&'a Node> = self
            .pool
            .nodes()
            .filter(|n| !n.is_host() || self.policy.can_allocate_tenant_node_to(n))
            .filter(|n| match &n.reserved_to {
                None => true,
                Some(tenant) => *tenant == self.request.application.tenant,
            })
            .collect();

        if self.request.allocate_fully {
            // Strict co-tenancy: only hosts already carrying this tenant's
            // nodes may receive more.
            let tenant_hosts: HashSet<&str> = self
                .pool
                .nodes()
                .filter(|n| n.node_type == NodeType::Tenant)
                .filter(|n| {
                    n.allocation
                        .as_ref()
                        .is_some_and(|a| a.owner.tenant == self.request.application.tenant)
                })
                .filter_map(|n| n.parent_hostname.as_deref())
                .collect();
            hosts.retain(|h| tenant_hosts.contains(h.hostname.as_str()));
        }

        for host in hosts {
            let is_spare = self.spare_hosts.contains(&host.hostname);
            if is_spare && !self.is_replacement {
                debug!(host = %host.hostname, "host is reserved as spare, skipped");
                continue;
            }
            if !self.capacity.has_capacity(host, &requested) {
                debug!(host = %host.hostname, "insufficient capacity for new child, skipped");
                continue;
            }
            let already_placed = !self
                .pool
                .children_of(&host.hostname)
                .owned_by(&self.request.application)
                .in_cluster(&self.request.cluster.id)
                .is_empty();
            if already_placed {
                debug!(host = %host.hostname, "cluster already has a node on host, skipped");
                continue;
            }

            let free = self.capacity.free_capacity_of(host, false);
            self.candidates
                .push(NodeCandidate::new_child(host, requested, free, is_spare));
        }
    }

    /// Apply switch grouping and the total ranking; returns the final
    /// ordered sequence. The caller consumes a prefix to satisfy its
    /// count and treats a short sequence as a capacity shortfall.
    pub fn prioritize(self) -> Vec<NodeCandidate<'a>> {
        let NodePrioritizer {
            request,
            candidates,
            ..
        } = self;

        let mut ranked = switches::mark_exclusive_switches(candidates, &request.cluster.id);
        ranked.sort_by(|a, b| a.compare(b));

        info!(
            application = %request.application,
            cluster = %request.cluster.id,
            candidates = ranked.len(),
            "prioritized node candidates"
        );
        ranked
    }

    /// Wrap an existing node, resolving its parent for capacity and
    /// spare accounting. Nodes whose parent is not in the snapshot are
    /// standalone.
    fn candidate_from(&self, node: &'a Node, is_surplus: bool) -> NodeCandidate<'a> {
        match self.pool.parent_of(node) {
            Some(parent) => {
                let free = self.capacity.free_capacity_of(parent, false);
                let can_resize = !self.request.allocate_fully
                    && self.request.spec.can_resize(
                        &node.resources,
                        &free,
                        self.is_topology_change,
                        self.current_cluster_size,
                    );
                NodeCandidate::child(
                    node,
                    parent,
                    free,
                    self.spare_hosts.contains(&parent.hostname),
                    is_surplus,
                    can_resize,
                )
            }
            None => NodeCandidate::standalone(node, is_surplus),
        }
    }

    /// A non-active node may have been allocated to a host we now want
    /// to drain; only re-offer it while its parent still takes tenant
    /// nodes.
    fn can_still_allocate_to_parent(&self, node: &Node) -> bool {
        match node.parent_hostname.as_deref() {
            None => true,
            Some(parent) => match self.pool.get(parent) {
                None => false,
                Some(parent) => self.policy.can_allocate_tenant_node_to(parent),
            },
        }
    }
}
