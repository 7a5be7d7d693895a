//! Provisioning configuration.
//!
//! Parsed from a TOML file kept next to the resource manager's other
//! deployment config. Everything has a default so an empty file (or no
//! file at all) yields a usable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::resources::Resources;

/// Provisioning knobs for the allocation core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// How many hosts to reserve as failure-recovery buffer.
    pub spare_count: u32,
    /// Resources withheld from every host's advertised vector before
    /// children are accounted (platform services, host OS).
    pub host_overhead: HostOverheadConfig,
}

/// Per-host overhead reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOverheadConfig {
    pub cpu_cores: u32,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

impl ProvisionConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProvisionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn overhead(&self) -> Resources {
        Resources::new(
            self.host_overhead.cpu_cores,
            self.host_overhead.memory_bytes,
            self.host_overhead.disk_bytes,
        )
    }
}

/// Turns a host record into the effective total vector it can offer to
/// children. Shared hosts advertise raw hardware; what is allocatable
/// depends on deployment-specific overhead, so the calculator is an
/// injected collaborator.
pub trait HostResourcesCalculator {
    fn effective_resources_of(&self, host: &Node) -> Resources;
}

/// Calculator backed by [`ProvisionConfig`]: advertised minus the
/// configured per-host overhead.
#[derive(Debug, Clone)]
pub struct ConfigResourcesCalculator {
    overhead: Resources,
}

impl ConfigResourcesCalculator {
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            overhead: config.overhead(),
        }
    }
}

impl HostResourcesCalculator for ConfigResourcesCalculator {
    fn effective_resources_of(&self, host: &Node) -> Resources {
        host.resources.minus(&self.overhead)
    }
}
