//! Read-only snapshot view over the node registry.
//!
//! A `NodePool` holds the nodes visible to one allocation decision. The
//! caller is responsible for locking the registry and building the
//! snapshot; the pool itself never mutates anything and hands out only
//! borrowed views. `PoolView` gives the chainable filtering vocabulary
//! the allocation core is written in.

use std::collections::HashMap;

use crate::node::{ApplicationId, ClusterId, ClusterType, HostName, Node, NodeState, NodeType};

/// Immutable snapshot of the node pool for one allocation decision.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Node>,
    by_hostname: HashMap<HostName, usize>,
}

impl NodePool {
    pub fn new(nodes: Vec<Node>) -> Self {
        let by_hostname = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.hostname.clone(), i))
            .collect();
        Self { nodes, by_hostname }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn get(&self, hostname: &str) -> Option<&Node> {
        self.by_hostname.get(hostname).map(|&i| &self.nodes[i])
    }

    /// The parent host of a virtual node, when it is in the snapshot.
    pub fn parent_of(&self, node: &Node) -> Option<&Node> {
        node.parent_hostname
            .as_deref()
            .and_then(|parent| self.get(parent))
    }

    /// All virtual nodes whose parent is `hostname`.
    pub fn children_of(&self, hostname: &str) -> PoolView<'_> {
        PoolView {
            nodes: self
                .nodes
                .iter()
                .filter(|n| n.parent_hostname.as_deref() == Some(hostname))
                .collect(),
        }
    }

    /// An unfiltered view over the whole snapshot.
    pub fn view(&self) -> PoolView<'_> {
        PoolView {
            nodes: self.nodes.iter().collect(),
        }
    }
}

/// Chainable, borrowed filter over pool nodes.
#[derive(Debug, Clone)]
pub struct PoolView<'a> {
    nodes: Vec<&'a Node>,
}

impl<'a> PoolView<'a> {
    pub fn owned_by(self, application: &ApplicationId) -> Self {
        self.retain(|n| n.allocated_to(application))
    }

    pub fn of_type(self, node_type: NodeType) -> Self {
        self.retain(|n| n.node_type == node_type)
    }

    pub fn in_state(self, state: NodeState) -> Self {
        self.retain(|n| n.state == state)
    }

    pub fn in_states(self, states: &[NodeState]) -> Self {
        self.retain(|n| states.contains(&n.state))
    }

    /// Nodes whose allocation names the given cluster.
    pub fn in_cluster(self, cluster: &ClusterId) -> Self {
        self.retain(|n| {
            n.allocation
                .as_ref()
                .is_some_and(|a| a.membership.cluster == *cluster)
        })
    }

    /// Nodes whose allocation carries the given cluster type.
    pub fn of_cluster_type(self, cluster_type: ClusterType) -> Self {
        self.retain(|n| {
            n.allocation
                .as_ref()
                .is_some_and(|a| a.membership.cluster_type == cluster_type)
        })
    }

    pub fn not_retired(self) -> Self {
        self.retain(|n| !n.is_retired())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.nodes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn retain(mut self, keep: impl Fn(&Node) -> bool) -> Self {
        self.nodes.retain(|n| keep(n));
        self
    }
}
