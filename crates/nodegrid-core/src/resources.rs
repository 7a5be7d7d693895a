//! Resource vectors for nodes and allocation requests.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Resource vector describing what a node offers or a request needs.
///
/// All dimensions are integers so that arithmetic is exact and every
/// ordering built on top of it is total. Subtraction saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resources {
    /// CPU cores.
    pub cpu_cores: u32,
    /// Memory in bytes.
    pub memory_bytes: u64,
    /// Disk in bytes.
    pub disk_bytes: u64,
    /// Network bandwidth in Mbps.
    pub bandwidth_mbps: u32,
    /// Accelerator devices. Zero for most nodes.
    pub accelerators: u32,
}

impl Resources {
    /// A vector with the three dimensions most requests quote; bandwidth
    /// and accelerators start at zero.
    pub fn new(cpu_cores: u32, memory_bytes: u64, disk_bytes: u64) -> Self {
        Self {
            cpu_cores,
            memory_bytes,
            disk_bytes,
            bandwidth_mbps: 0,
            accelerators: 0,
        }
    }

    pub fn with_bandwidth(mut self, bandwidth_mbps: u32) -> Self {
        self.bandwidth_mbps = bandwidth_mbps;
        self
    }

    pub fn with_accelerators(mut self, accelerators: u32) -> Self {
        self.accelerators = accelerators;
        self
    }

    /// Element-wise sum.
    pub fn plus(&self, other: &Resources) -> Resources {
        Resources {
            cpu_cores: self.cpu_cores + other.cpu_cores,
            memory_bytes: self.memory_bytes + other.memory_bytes,
            disk_bytes: self.disk_bytes + other.disk_bytes,
            bandwidth_mbps: self.bandwidth_mbps + other.bandwidth_mbps,
            accelerators: self.accelerators + other.accelerators,
        }
    }

    /// Element-wise difference, saturating at zero.
    pub fn minus(&self, other: &Resources) -> Resources {
        Resources {
            cpu_cores: self.cpu_cores.saturating_sub(other.cpu_cores),
            memory_bytes: self.memory_bytes.saturating_sub(other.memory_bytes),
            disk_bytes: self.disk_bytes.saturating_sub(other.disk_bytes),
            bandwidth_mbps: self.bandwidth_mbps.saturating_sub(other.bandwidth_mbps),
            accelerators: self.accelerators.saturating_sub(other.accelerators),
        }
    }

    /// True when every dimension covers `other`.
    pub fn satisfies(&self, other: &Resources) -> bool {
        self.cpu_cores >= other.cpu_cores
            && self.memory_bytes >= other.memory_bytes
            && self.disk_bytes >= other.disk_bytes
            && self.bandwidth_mbps >= other.bandwidth_mbps
            && self.accelerators >= other.accelerators
    }

    pub fn is_zero(&self) -> bool {
        *self == Resources::default()
    }

    /// Deterministic ordering of capacity amounts: cpu, then memory, then
    /// disk, then bandwidth, then accelerators. Used to pick spare hosts
    /// and to break candidate ties by "more free capacity".
    pub fn capacity_cmp(&self, other: &Resources) -> Ordering {
        self.cpu_cores
            .cmp(&other.cpu_cores)
            .then(self.memory_bytes.cmp(&other.memory_bytes))
            .then(self.disk_bytes.cmp(&other.disk_bytes))
            .then(self.bandwidth_mbps.cmp(&other.bandwidth_mbps))
            .then(self.accelerators.cmp(&other.accelerators))
    }
}
