//! NodeGrid allocation core — spare-aware, switch-diverse node
//! prioritization.
//!
//! Given a locked snapshot of the node pool and one allocation request,
//! this crate produces a ranked, deterministic sequence of candidate
//! nodes. It reconciles existing allocations, failure-domain spare
//! reservation, network-switch diversity, in-place resize feasibility,
//! and carving of new virtual nodes out of shared hosts. It never
//! mutates anything: committing the top candidates is the caller's
//! transaction.
//!
//! # Components
//!
//! - **`capacity`** — host headroom accounting and spare-host selection
//! - **`candidate`** — candidate model and the total ranking
//! - **`switches`** — at most one network-exclusive candidate per switch
//! - **`prioritizer`** — candidate collection and final ordering

pub mod candidate;
pub mod capacity;
pub mod error;
pub mod prioritizer;
pub mod switches;

pub use candidate::{CandidateKind, NodeCandidate};
pub use capacity::HostCapacity;
pub use error::{AllocationError, AllocationResult};
pub use prioritizer::{AllocationRequest, NodePrioritizer};
pub use switches::{ClusterSwitch, mark_exclusive_switches};
