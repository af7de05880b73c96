//! Workloads as delivered by the control plane.

use std::collections::HashMap;
use std::fmt;

use geoplace_placement::{ContainerRequests, Workload};
use serde::{Deserialize, Serialize};

/// Identity of a workload within the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A workload awaiting placement, as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWorkload {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub containers: Vec<ContainerRequests>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl RawWorkload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: default_namespace(),
            labels: HashMap::new(),
            containers: Vec::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_container(mut self, cpu: u64, memory: u64) -> Self {
        self.containers.push(ContainerRequests { cpu, memory });
        self
    }

    pub fn workload_ref(&self) -> WorkloadRef {
        WorkloadRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// The placement view, with requests summed across containers.
    pub fn to_workload(&self) -> Workload {
        Workload::from_containers(
            self.name.clone(),
            self.namespace.clone(),
            self.labels.clone(),
            &self.containers,
        )
    }
}
