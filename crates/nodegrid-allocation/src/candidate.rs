//! Candidate nodes and their ranking.
//!
//! A candidate wraps one way of satisfying part of a request: an
//! existing node (on a host or standalone) or a new virtual node to be
//! carved out of a host. Candidates are plain values built fresh for
//! one decision and discarded with it.

use std::cmp::Ordering;

use nodegrid_core::{ClusterId, Node, Resources};

/// What a candidate refers to.
#[derive(Debug, Clone)]
pub enum CandidateKind<'a> {
    /// Existing virtual node whose parent host is in the snapshot.
    Child { node: &'a Node, parent: &'a Node },
    /// Existing node without a resolvable parent.
    Standalone { node: &'a Node },
    /// Proposed new virtual node to be carved out of `parent`.
    NewChild { parent: &'a Node, resources: Resources },
}

/// One node (existing or proposed) annotated with the facts ranking
/// needs.
#[derive(Debug, Clone)]
pub struct NodeCandidate<'a> {
    pub kind: CandidateKind<'a>,
    /// Would consume a host reserved as failure-recovery buffer.
    pub violates_spares: bool,
    /// Reclaimed from a previous downsize of this application.
    pub is_surplus: bool,
    /// Counts toward switch diversity until demoted by grouping.
    pub exclusive_switch: bool,
    /// Eligible for in-place resize instead of replacement.
    pub can_resize: bool,
    /// Free capacity on the parent host; zero for parentless nodes.
    pub free_parent_capacity: Resources,
}

impl<'a> NodeCandidate<'a> {
    pub fn child(
        node: &'a Node,
        parent: &'a Node,
        free_parent_capacity: Resources,
        violates_spares: bool,
        is_surplus: bool,
        can_resize: bool,
    ) -> Self {
        Self {
            kind: CandidateKind::Child { node, parent },
            violates_spares,
            is_surplus,
            exclusive_switch: true,
            can_resize,
            free_parent_capacity,
        }
    }

    pub fn standalone(node: &'a Node, is_surplus: bool) -> Self {
        Self {
            kind: CandidateKind::Standalone { node },
            violates_spares: false,
            is_surplus,
            exclusive_switch: true,
            can_resize: false,
            free_parent_capacity: Resources::default(),
        }
    }

    pub fn new_child(
        parent: &'a Node,
        resources: Resources,
        free_parent_capacity: Resources,
        violates_spares: bool,
    ) -> Self {
        Self {
            kind: CandidateKind::NewChild { parent, resources },
            violates_spares,
            is_surplus: false,
            exclusive_switch: true,
            can_resize: false,
            free_parent_capacity,
        }
    }

    /// True for to-be-created nodes.
    pub fn is_new(&self) -> bool {
        matches!(self.kind, CandidateKind::NewChild { .. })
    }

    /// The existing node, when there is one.
    pub fn node(&self) -> Option<&'a Node> {
        match self.kind {
            CandidateKind::Child { node, .. } | CandidateKind::Standalone { node } => Some(node),
            CandidateKind::NewChild { .. } => None,
        }
    }

    /// Stable name used for deterministic tie-breaking: the node's
    /// hostname, or the parent hostname for a proposed new child.
    pub fn name(&self) -> &'a str {
        match self.kind {
            CandidateKind::Child { node, .. } | CandidateKind::Standalone { node } => {
                &node.hostname
            }
            CandidateKind::NewChild { parent, .. } => &parent.hostname,
        }
    }

    /// The host a committed candidate would live on, when known.
    pub fn parent_hostname(&self) -> Option<&'a str> {
        match self.kind {
            CandidateKind::Child { parent, .. } | CandidateKind::NewChild { parent, .. } => {
                Some(&parent.hostname)
            }
            CandidateKind::Standalone { node } => node.parent_hostname.as_deref(),
        }
    }

    /// The vector this candidate carries: an existing node's resources,
    /// or the requested vector for a new child.
    pub fn resources(&self) -> &Resources {
        match &self.kind {
            CandidateKind::Child { node, .. } | CandidateKind::Standalone { node } => {
                &node.resources
            }
            CandidateKind::NewChild { resources, .. } => resources,
        }
    }

    /// The switch the candidate sits behind: the parent's for children,
    /// the node's own otherwise.
    pub fn switch_hostname(&self) -> Option<&'a str> {
        match self.kind {
            CandidateKind::Child { parent, .. } | CandidateKind::NewChild { parent, .. } => {
                parent.switch_hostname.as_deref()
            }
            CandidateKind::Standalone { node } => node.switch_hostname.as_deref(),
        }
    }

    /// Cluster this candidate is already allocated to, if any.
    pub fn allocated_cluster(&self) -> Option<&'a ClusterId> {
        self.node()
            .and_then(|n| n.allocation.as_ref())
            .map(|a| &a.membership.cluster)
    }

    pub fn with_exclusive_switch(mut self, exclusive: bool) -> Self {
        self.exclusive_switch = exclusive;
        self
    }

    /// Total ranking, best candidate first. Precedence, most significant
    /// first:
    ///
    /// 1. spare-respecting before spare-violating,
    /// 2. existing nodes before proposed new children,
    /// 3. exclusive-switch before demoted,
    /// 4. resizable in place before replace-requiring,
    /// 5. more free parent capacity first,
    ///
    /// with remaining ties broken by [`NodeCandidate::name`] so repeated
    /// runs over one snapshot produce identical output.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.violates_spares
            .cmp(&other.violates_spares)
            .then_with(|| self.is_new().cmp(&other.is_new()))
            .then_with(|| other.exclusive_switch.cmp(&self.exclusive_switch))
            .then_with(|| other.can_resize.cmp(&self.can_resize))
            .then_with(|| {
                other
                    .free_parent_capacity
                    .capacity_cmp(&self.free_parent_capacity)
            })
            .then_with(|| self.name().cmp(other.name()))
    }
}
