//! Workload as seen by a scheduling decision.

use std::collections::HashMap;

use geoplace_inventory::NodeFilter;
use serde::{Deserialize, Serialize};

/// Resource requests of one container, in milli-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRequests {
    #[serde(default)]
    pub cpu: u64,
    #[serde(default)]
    pub memory: u64,
}

/// A unit of work awaiting placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    pub labels: HashMap<String, String>,
    pub requested_cpu: u64,
    pub requested_memory: u64,
}

impl Workload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a workload whose requests are the sum over its containers.
    pub fn from_containers(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: HashMap<String, String>,
        containers: &[ContainerRequests],
    ) -> Self {
        let (requested_cpu, requested_memory) =
            containers.iter().fold((0u64, 0u64), |(cpu, memory), c| {
                (cpu.saturating_add(c.cpu), memory.saturating_add(c.memory))
            });

        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels,
            requested_cpu,
            requested_memory,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_requests(mut self, cpu: u64, memory: u64) -> Self {
        self.requested_cpu = cpu;
        self.requested_memory = memory;
        self
    }

    /// Filter requiring enough capacity for this workload's requests.
    pub fn resource_filter(&self) -> NodeFilter {
        NodeFilter::resources(self.requested_cpu, self.requested_memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_container_requests() {
        let workload = Workload::from_containers(
            "web",
            "default",
            HashMap::new(),
            &[
                ContainerRequests {
                    cpu: 250,
                    memory: 1_000,
                },
                ContainerRequests {
                    cpu: 750,
                    memory: 3_000,
                },
            ],
        );
        assert_eq!(workload.requested_cpu, 1_000);
        assert_eq!(workload.requested_memory, 4_000);
        assert_eq!(workload.resource_filter(), NodeFilter::resources(1_000, 4_000));
    }

    #[test]
    fn no_containers_requests_nothing() {
        let workload = Workload::from_containers("idle", "default", HashMap::new(), &[]);
        assert_eq!(workload.resource_filter(), NodeFilter::default());
    }
}
