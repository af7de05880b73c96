//! Placement error types.

use thiserror::Error;

/// Why no node could be chosen for a workload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// The inventory is empty, or every node is filtered out.
    #[error("no nodes are available")]
    NoNodesAvailable,

    /// A required location constraint found no node at any tier.
    #[error("no nodes match {constraint} for workload {workload}")]
    NoLocationMatch { workload: String, constraint: String },
}

pub type PlacementResult<T> = Result<T, PlacementError>;
