//! Node model and the label vocabulary used to read it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A schedulable edge node as held by the inventory.
///
/// Capacities are milli-units: allocatable capacity minus what workloads
/// already placed on the node have requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub available_cpu: u64,
    pub available_memory: u64,
}

/// A node exactly as reported by the cluster control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub allocatable_cpu: u64,
    #[serde(default)]
    pub allocatable_memory: u64,
    /// CPU already requested by workloads running on the node.
    #[serde(default)]
    pub reserved_cpu: u64,
    /// Memory already requested by workloads running on the node.
    #[serde(default)]
    pub reserved_memory: u64,
}

impl RawNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_allocatable(mut self, cpu: u64, memory: u64) -> Self {
        self.allocatable_cpu = cpu;
        self.allocatable_memory = memory;
        self
    }

    pub fn with_reserved(mut self, cpu: u64, memory: u64) -> Self {
        self.reserved_cpu = cpu;
        self.reserved_memory = memory;
        self
    }

    pub fn available_cpu(&self) -> u64 {
        self.allocatable_cpu.saturating_sub(self.reserved_cpu)
    }

    pub fn available_memory(&self) -> u64 {
        self.allocatable_memory.saturating_sub(self.reserved_memory)
    }

    /// Build the inventory view of this node.
    pub fn to_node(&self) -> Node {
        Node {
            name: self.name.clone(),
            labels: self.labels.clone(),
            available_cpu: self.available_cpu(),
            available_memory: self.available_memory(),
        }
    }
}

/// Label keys the inventory reads from raw nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelKeys {
    /// Presence (any value) marks a node as edge-capable.
    pub role: String,
    pub city: String,
    pub country: String,
    pub continent: String,
}

impl Default for LabelKeys {
    fn default() -> Self {
        Self {
            role: "node-role.kubernetes.io/edge".to_string(),
            city: "node.geoplace.io/city".to_string(),
            country: "node.geoplace.io/country".to_string(),
            continent: "node.geoplace.io/continent".to_string(),
        }
    }
}

impl LabelKeys {
    /// Whether the node carries the edge-capable role label.
    pub fn is_edge(&self, raw: &RawNode) -> bool {
        raw.labels.contains_key(&self.role)
    }

    /// Non-empty city label value.
    pub fn city<'a>(&self, raw: &'a RawNode) -> Option<&'a str> {
        non_empty(raw, &self.city)
    }

    /// Non-empty country label value.
    pub fn country<'a>(&self, raw: &'a RawNode) -> Option<&'a str> {
        non_empty(raw, &self.country)
    }

    /// Non-empty continent label value.
    pub fn continent<'a>(&self, raw: &'a RawNode) -> Option<&'a str> {
        non_empty(raw, &self.continent)
    }

    /// Whether an update touches a field that index membership depends on.
    ///
    /// Compares exactly the name and the three geography label values.
    pub fn has_significant_change(&self, old: &RawNode, new: &RawNode) -> bool {
        old.name != new.name
            || old.labels.get(&self.city) != new.labels.get(&self.city)
            || old.labels.get(&self.country) != new.labels.get(&self.country)
            || old.labels.get(&self.continent) != new.labels.get(&self.continent)
    }
}

fn non_empty<'a>(raw: &'a RawNode, key: &str) -> Option<&'a str> {
    raw.labels
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}
