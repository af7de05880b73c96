//! Resource filter applied to every candidate node.

use crate::node::Node;

/// Minimum requirements a node must meet to be returned by a query.
///
/// A threshold of zero means "unconstrained", not "must be exactly zero".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    /// Label keys the node must carry (any value).
    pub labels: Vec<String>,
    pub cpu: u64,
    pub memory: u64,
}

impl NodeFilter {
    /// A filter on CPU and memory only.
    pub fn resources(cpu: u64, memory: u64) -> Self {
        Self {
            labels: Vec::new(),
            cpu,
            memory,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>) -> Self {
        self.labels.push(key.into());
        self
    }

    /// Whether `node` satisfies every requirement of this filter.
    pub fn matches(&self, node: &Node) -> bool {
        if !self.labels.iter().all(|key| node.labels.contains_key(key)) {
            return false;
        }

        if self.cpu != 0 && node.available_cpu < self.cpu {
            return false;
        }

        if self.memory != 0 && node.available_memory < self.memory {
            return false;
        }

        true
    }
}

/// Apply an optional filter; an absent filter matches every node.
pub fn matches(node: &Node, filter: Option<&NodeFilter>) -> bool {
    filter.is_none_or(|f| f.matches(node))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn make_node(cpu: u64, memory: u64) -> Node {
        Node {
            name: "n1".to_string(),
            labels: HashMap::new(),
            available_cpu: cpu,
            available_memory: memory,
        }
    }

    #[test]
    fn absent_filter_matches() {
        assert!(matches(&make_node(0, 0), None));
    }

    #[test]
    fn zero_thresholds_are_unconstrained() {
        let filter = NodeFilter::default();
        assert!(filter.matches(&make_node(0, 0)));
    }

    #[test]
    fn rejects_insufficient_cpu() {
        let filter = NodeFilter::resources(10_000, 0);
        assert!(!filter.matches(&make_node(5_000, 50_000)));
        assert!(filter.matches(&make_node(10_000, 0)));
    }

    #[test]
    fn rejects_insufficient_memory() {
        let filter = NodeFilter::resources(0, 10_000);
        assert!(!filter.matches(&make_node(50_000, 5_000)));
        assert!(matches(&make_node(0, 20_000), Some(&filter)));
    }

    #[test]
    fn requires_every_label() {
        let mut node = make_node(1, 1);
        node.labels.insert("gpu".to_string(), "a100".to_string());

        let filter = NodeFilter::default().with_label("gpu");
        assert!(filter.matches(&node));

        let filter = filter.with_label("ssd");
        assert!(!filter.matches(&node));
    }
}
