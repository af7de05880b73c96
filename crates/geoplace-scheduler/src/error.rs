//! Scheduler error types.

use geoplace_placement::PlacementError;
use thiserror::Error;

/// Errors that can occur while scheduling one workload.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("placement failed: {0}")]
    Placement(#[from] PlacementError),

    #[error("capacity for {workload} was taken by concurrent decisions {attempts} times")]
    Contended { workload: String, attempts: usize },

    #[error("binding {workload} to node {node} failed: {source}")]
    Bind {
        workload: String,
        node: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
