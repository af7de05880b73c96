//! Location-aware placement over pooled tier candidates.

use std::sync::Arc;

use geoplace_geo::GeoReference;
use geoplace_inventory::{Node, NodeInventory};
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmKind, pick, place_by_location};
use crate::error::PlacementResult;
use crate::location::LocationLabels;
use crate::resolver::CandidateResolver;
use crate::workload::Workload;

/// Walks the tier cascade, picking uniformly from the first non-empty step.
///
/// The naive variant skips resource filtering at every tier, including the
/// unconstrained fallback.
pub struct LocationAlgorithm {
    inventory: NodeInventory,
    resolver: CandidateResolver,
    labels: LocationLabels,
    resource_filtering: bool,
}

impl LocationAlgorithm {
    pub fn new(
        inventory: NodeInventory,
        geo: Arc<dyn GeoReference>,
        labels: LocationLabels,
    ) -> Self {
        Self {
            resolver: CandidateResolver::new(inventory.clone(), geo),
            inventory,
            labels,
            resource_filtering: true,
        }
    }

    pub fn naive(
        inventory: NodeInventory,
        geo: Arc<dyn GeoReference>,
        labels: LocationLabels,
    ) -> Self {
        Self {
            resource_filtering: false,
            ..Self::new(inventory, geo, labels)
        }
    }
}

impl Algorithm for LocationAlgorithm {
    fn kind(&self) -> AlgorithmKind {
        if self.resource_filtering {
            AlgorithmKind::Location
        } else {
            AlgorithmKind::NaiveLocation
        }
    }

    fn get_node(&self, workload: &Workload) -> PlacementResult<Node> {
        let filter = self.resource_filtering.then(|| workload.resource_filter());

        place_by_location(
            &self.inventory,
            &self.labels,
            workload,
            filter.as_ref(),
            |constraint, filter| {
                let (step, candidates) = self.resolver.resolve(constraint, filter)?;
                debug!(
                    workload = %workload.name,
                    %step,
                    candidates = candidates.len(),
                    "location matched"
                );
                pick(&candidates)
            },
        )
    }
}
