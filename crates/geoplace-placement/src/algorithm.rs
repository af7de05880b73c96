//! Scheduling algorithm abstraction and the shared location flow.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use geoplace_geo::GeoReference;
use geoplace_inventory::{Node, NodeFilter, NodeInventory};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{PlacementError, PlacementResult};
use crate::location::{LocationConstraint, LocationKind, LocationLabels};
use crate::random::RandomAlgorithm;
use crate::ranked::MetricsLocationAlgorithm;
use crate::tiered::LocationAlgorithm;
use crate::workload::Workload;

/// A placement strategy: one workload in, one node out.
///
/// Implementations hold no per-call state, so a single instance serves
/// concurrent decisions.
pub trait Algorithm: Send + Sync {
    fn kind(&self) -> AlgorithmKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Whether returned nodes are known to fit the workload's requests.
    fn filters_resources(&self) -> bool {
        self.kind().filters_resources()
    }

    fn get_node(&self, workload: &Workload) -> PlacementResult<Node>;
}

/// Selectable algorithm variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    Random,
    #[serde(alias = "naivelocation", alias = "naiveLocation")]
    NaiveLocation,
    #[default]
    Location,
    #[serde(alias = "metricslocation", alias = "metricsLocation")]
    MetricsLocation,
}

impl AlgorithmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::Random => "random",
            AlgorithmKind::NaiveLocation => "naive-location",
            AlgorithmKind::Location => "location",
            AlgorithmKind::MetricsLocation => "metrics-location",
        }
    }

    /// Random and naive-location place without looking at capacity.
    pub fn filters_resources(&self) -> bool {
        matches!(self, AlgorithmKind::Location | AlgorithmKind::MetricsLocation)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown scheduling algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for AlgorithmKind {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(AlgorithmKind::Random),
            "naive-location" | "naivelocation" => Ok(AlgorithmKind::NaiveLocation),
            "location" => Ok(AlgorithmKind::Location),
            "metrics-location" | "metricslocation" => Ok(AlgorithmKind::MetricsLocation),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Construct the configured algorithm.
pub fn build_algorithm(
    kind: AlgorithmKind,
    inventory: NodeInventory,
    geo: Arc<dyn GeoReference>,
    labels: LocationLabels,
) -> Arc<dyn Algorithm> {
    info!(algorithm = %kind, "scheduling algorithm selected");
    match kind {
        AlgorithmKind::Random => Arc::new(RandomAlgorithm::new(inventory)),
        AlgorithmKind::NaiveLocation => Arc::new(LocationAlgorithm::naive(inventory, geo, labels)),
        AlgorithmKind::Location => Arc::new(LocationAlgorithm::new(inventory, geo, labels)),
        AlgorithmKind::MetricsLocation => {
            Arc::new(MetricsLocationAlgorithm::new(inventory, labels))
        }
    }
}

/// Uniform pick among candidates.
pub(crate) fn pick(candidates: &[Node]) -> Option<Node> {
    candidates.choose(&mut rand::rng()).cloned()
}

/// Uniform pick among every node passing `filter`.
pub(crate) fn pick_any(
    inventory: &NodeInventory,
    filter: Option<&NodeFilter>,
) -> PlacementResult<Node> {
    let candidates = inventory.nodes_matching(filter);
    debug!(candidates = candidates.len(), "picking from all eligible nodes");
    pick(&candidates).ok_or(PlacementError::NoNodesAvailable)
}

/// The decision flow shared by every location-aware variant.
///
/// `locate` runs the tier cascade for a parsed constraint. A required
/// constraint that `locate` cannot satisfy fails; a preferred one falls back
/// to any eligible node.
pub(crate) fn place_by_location<F>(
    inventory: &NodeInventory,
    labels: &LocationLabels,
    workload: &Workload,
    filter: Option<&NodeFilter>,
    locate: F,
) -> PlacementResult<Node>
where
    F: FnOnce(&LocationConstraint, Option<&NodeFilter>) -> Option<Node>,
{
    if inventory.count_nodes() == 0 {
        return Err(PlacementError::NoNodesAvailable);
    }

    let Some(constraint) = LocationConstraint::from_labels(&workload.labels, labels) else {
        debug!(workload = %workload.name, "no location constraint");
        return pick_any(inventory, filter);
    };

    debug!(workload = %workload.name, %constraint, "resolving location");
    if let Some(node) = locate(&constraint, filter) {
        return Ok(node);
    }

    match constraint.kind {
        LocationKind::Required => Err(PlacementError::NoLocationMatch {
            workload: workload.name.clone(),
            constraint: constraint.to_string(),
        }),
        LocationKind::Preferred => {
            debug!(
                workload = %workload.name,
                %constraint,
                "preferred location unmet, falling back"
            );
            pick_any(inventory, filter)
        }
    }
}
