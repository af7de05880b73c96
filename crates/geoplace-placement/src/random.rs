//! Uniform random placement, ignoring location and resources.

use geoplace_inventory::{Node, NodeInventory};
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmKind, pick_any};
use crate::error::PlacementResult;
use crate::workload::Workload;

pub struct RandomAlgorithm {
    inventory: NodeInventory,
}

impl RandomAlgorithm {
    pub fn new(inventory: NodeInventory) -> Self {
        Self { inventory }
    }
}

impl Algorithm for RandomAlgorithm {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Random
    }

    fn get_node(&self, workload: &Workload) -> PlacementResult<Node> {
        let node = pick_any(&self.inventory, None)?;
        debug!(workload = %workload.name, node = %node.name, "random node chosen");
        Ok(node)
    }
}
