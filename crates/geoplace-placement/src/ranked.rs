//! Location-aware placement honouring the declared order of names.
//!
//! Same cascade as [`LocationAlgorithm`](crate::tiered::LocationAlgorithm),
//! but within a step the first listed name with an eligible node wins
//! instead of pooling every name's candidates.

use geoplace_inventory::{LookupError, Node, NodeFilter, NodeInventory};
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmKind, place_by_location};
use crate::error::PlacementResult;
use crate::location::{LocationConstraint, LocationLabels};
use crate::resolver::CascadeStep;
use crate::workload::Workload;

pub struct MetricsLocationAlgorithm {
    inventory: NodeInventory,
    labels: LocationLabels,
}

impl MetricsLocationAlgorithm {
    pub fn new(inventory: NodeInventory, labels: LocationLabels) -> Self {
        Self { inventory, labels }
    }

    fn first_hit(
        &self,
        step: CascadeStep,
        names: &[String],
        filter: Option<&NodeFilter>,
    ) -> Result<Node, LookupError> {
        match step {
            CascadeStep::City => self.inventory.any_node_by_city(names, filter),
            CascadeStep::CityCountry => self.inventory.any_node_by_city_country(names, filter),
            CascadeStep::CityContinent => self.inventory.any_node_by_city_continent(names, filter),
            CascadeStep::Country => self.inventory.any_node_by_country(names, filter),
            CascadeStep::CountryContinent => {
                self.inventory.any_node_by_country_continent(names, filter)
            }
            CascadeStep::Continent => self.inventory.any_node_by_continent(names, filter),
        }
    }

    fn locate(&self, constraint: &LocationConstraint, filter: Option<&NodeFilter>) -> Option<Node> {
        CascadeStep::ORDER.into_iter().find_map(|step| {
            match self.first_hit(step, step.names(constraint), filter) {
                Ok(node) => {
                    debug!(%step, node = %node.name, "location matched");
                    Some(node)
                }
                Err(e) => {
                    debug!(%step, reason = %e, "no node at step");
                    None
                }
            }
        })
    }
}

impl Algorithm for MetricsLocationAlgorithm {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::MetricsLocation
    }

    fn get_node(&self, workload: &Workload) -> PlacementResult<Node> {
        let filter = workload.resource_filter();
        place_by_location(
            &self.inventory,
            &self.labels,
            workload,
            Some(&filter),
            |constraint, filter| self.locate(constraint, filter),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geoplace_geo::Gazetteer;
    use geoplace_inventory::{LabelKeys, RawNode};

    use super::*;
    use crate::error::PlacementError;

    fn algorithm_with(nodes: &[(&str, &str, &str, &str, u64)]) -> MetricsLocationAlgorithm {
        let inventory = NodeInventory::new(Arc::new(Gazetteer::builtin()));
        let keys = LabelKeys::default();
        for (name, city, country, continent, capacity) in nodes {
            inventory.apply_add(
                &RawNode::new(*name)
                    .with_label(&keys.role, "")
                    .with_label(&keys.city, *city)
                    .with_label(&keys.country, *country)
                    .with_label(&keys.continent, *continent)
                    .with_allocatable(*capacity, *capacity),
            );
        }
        MetricsLocationAlgorithm::new(inventory, LocationLabels::default())
    }

    fn required(location: &str) -> Workload {
        Workload::new("w")
            .with_label(LocationLabels::default().required, location)
            .with_requests(10_000, 10_000)
    }

    #[test]
    fn first_listed_city_wins() {
        let algorithm = algorithm_with(&[
            ("braga", "Braga", "PT", "Europe", 20_000),
            ("porto", "Porto", "PT", "Europe", 20_000),
        ]);
        for _ in 0..20 {
            assert_eq!(algorithm.get_node(&required("Porto_Braga--")).unwrap().name, "porto");
        }
    }

    #[test]
    fn unresolvable_names_do_not_stop_the_cascade() {
        let algorithm = algorithm_with(&[("braga", "Braga", "PT", "Europe", 20_000)]);
        assert_eq!(algorithm.get_node(&required("Atlantis-PT-")).unwrap().name, "braga");
        assert_eq!(algorithm.get_node(&required("Atlantis-Narnia-Europe")).unwrap().name, "braga");
    }

    #[test]
    fn filters_by_resources() {
        let algorithm = algorithm_with(&[("braga", "Braga", "PT", "Europe", 5_000)]);
        assert!(matches!(
            algorithm.get_node(&required("Braga--")),
            Err(PlacementError::NoLocationMatch { .. })
        ));
    }
}
