//! Node records and allocation metadata.
//!
//! These are the registry-owned records this core reads but never
//! mutates. A `Node` is either a physical host or a virtual node carved
//! out of one; an `Allocation` binds a node to exactly one application
//! and one cluster membership.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resources::Resources;

/// Unique identifier for a node (physical or virtual).
pub type HostName = String;

/// Unique identifier for a cluster within an application.
pub type ClusterId = String;

/// Index of a replica group within a cluster.
pub type GroupIndex = u32;

/// Physical or virtual node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Physical machine capable of hosting virtual children.
    Host,
    /// Virtual node running atop a host.
    Tenant,
}

/// Lifecycle state of a node in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Provisioned,
    Ready,
    Reserved,
    Active,
    Inactive,
    Failed,
    Parked,
    Dirty,
}

/// Owner of an allocation: a tenant plus one of its applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
    pub tenant: String,
    pub application: String,
}

impl ApplicationId {
    pub fn new(tenant: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            application: application.into(),
        }
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.application)
    }
}

/// Role a cluster plays for its application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    Stateless,
    Stateful,
    Admin,
}

/// Cluster membership of an allocated node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMembership {
    pub cluster: ClusterId,
    pub cluster_type: ClusterType,
    pub group: Option<GroupIndex>,
    /// Slated for removal from the cluster but still serving. Retired
    /// nodes are excluded from current-size counts yet remain real
    /// allocations until released.
    pub retired: bool,
}

/// Allocation record binding a node to exactly one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub owner: ApplicationId,
    pub membership: ClusterMembership,
}

/// Requested cluster shape for one allocation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub id: ClusterId,
    pub cluster_type: ClusterType,
    /// The specific replica group being allocated for, when the request
    /// targets one.
    pub group: Option<GroupIndex>,
}

impl ClusterSpec {
    pub fn new(id: impl Into<ClusterId>, cluster_type: ClusterType) -> Self {
        Self {
            id: id.into(),
            cluster_type,
            group: None,
        }
    }

    pub fn with_group(mut self, group: GroupIndex) -> Self {
        self.group = Some(group);
        self
    }
}

/// A compute node record from the registry snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub hostname: HostName,
    pub node_type: NodeType,
    pub state: NodeState,
    pub resources: Resources,
    /// Set iff the node is virtual.
    pub parent_hostname: Option<HostName>,
    /// Network switch the node (or its host) is attached to, when the
    /// topology is known.
    pub switch_hostname: Option<String>,
    pub allocation: Option<Allocation>,
    /// Tenant this host is reserved for, if any. Hosts reserved to one
    /// tenant never receive another tenant's nodes.
    pub reserved_to: Option<String>,
}

impl Node {
    pub fn new(
        hostname: impl Into<HostName>,
        node_type: NodeType,
        state: NodeState,
        resources: Resources,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            node_type,
            state,
            resources,
            parent_hostname: None,
            switch_hostname: None,
            allocation: None,
            reserved_to: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<HostName>) -> Self {
        self.parent_hostname = Some(parent.into());
        self
    }

    pub fn with_switch(mut self, switch: impl Into<String>) -> Self {
        self.switch_hostname = Some(switch.into());
        self
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.allocation = Some(allocation);
        self
    }

    pub fn reserved_to(mut self, tenant: impl Into<String>) -> Self {
        self.reserved_to = Some(tenant.into());
        self
    }

    pub fn is_host(&self) -> bool {
        self.node_type == NodeType::Host
    }

    /// True when this node is allocated and owned by `application`.
    pub fn allocated_to(&self, application: &ApplicationId) -> bool {
        self.allocation
            .as_ref()
            .is_some_and(|a| a.owner == *application)
    }

    /// True when the node's allocation is marked retired.
    pub fn is_retired(&self) -> bool {
        self.allocation
            .as_ref()
            .is_some_and(|a| a.membership.retired)
    }
}
