//! Network-switch grouping for failure-domain diversity.
//!
//! Only one candidate per physical switch may count toward a cluster's
//! network-diversity requirement. Extra candidates behind the same
//! switch stay usable as fallback but are demoted so they are never
//! double-counted as independent failure domains.

use std::collections::BTreeMap;

use nodegrid_core::ClusterId;

use crate::candidate::NodeCandidate;

/// A cluster and the network switch a candidate sits behind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterSwitch {
    /// No switch identity known for the host.
    Unknown,
    Known {
        cluster: ClusterId,
        switch_hostname: String,
    },
}

impl ClusterSwitch {
    pub fn from(cluster: &ClusterId, switch_hostname: Option<&str>) -> Self {
        match switch_hostname {
            None => ClusterSwitch::Unknown,
            Some(switch) => ClusterSwitch::Known {
                cluster: cluster.clone(),
                switch_hostname: switch.to_string(),
            },
        }
    }
}

/// Demote all but the best-ranked candidate in every concrete switch
/// group.
///
/// Candidates with no switch identity keep `exclusive_switch = true`:
/// absent topology information must never read as "all on one switch".
pub fn mark_exclusive_switches<'a>(
    candidates: Vec<NodeCandidate<'a>>,
    requested_cluster: &ClusterId,
) -> Vec<NodeCandidate<'a>> {
    // BTreeMap so group order (and therefore the relative order of
    // candidates that compare equal in the final sort) is reproducible.
    let mut groups: BTreeMap<ClusterSwitch, Vec<NodeCandidate<'a>>> = BTreeMap::new();
    for candidate in candidates {
        let cluster = candidate
            .allocated_cluster()
            .unwrap_or(requested_cluster);
        let key = ClusterSwitch::from(cluster, candidate.switch_hostname());
        groups.entry(key).or_default().push(candidate);
    }

    let mut marked = Vec::new();
    for (key, mut group) in groups {
        if key == ClusterSwitch::Unknown {
            marked.extend(group);
            continue;
        }
        group.sort_by(|a, b| a.compare(b));
        let mut ranked = group.into_iter();
        if let Some(best) = ranked.next() {
            marked.push(best);
        }
        marked.extend(ranked.map(|c| c.with_exclusive_switch(false)));
    }
    marked
}
