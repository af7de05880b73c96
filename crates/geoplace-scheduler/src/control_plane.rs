//! Port to the cluster control plane.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workload::WorkloadRef;

/// Severity of an outcome notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeType {
    Normal,
    Warning,
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeType::Normal => f.write_str("Normal"),
            OutcomeType::Warning => f.write_str("Warning"),
        }
    }
}

/// Result of one scheduling attempt, as reported to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Bound to `node`.
    Scheduled { node: String },
    /// No node could be chosen.
    NodeError { error: String },
    /// A node was chosen but the binding was rejected.
    BindError { node: String, error: String },
}

impl Outcome {
    pub fn outcome_type(&self) -> OutcomeType {
        match self {
            Outcome::Scheduled { .. } => OutcomeType::Normal,
            Outcome::NodeError { .. } | Outcome::BindError { .. } => OutcomeType::Warning,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Outcome::Scheduled { .. } => "Scheduled",
            Outcome::NodeError { .. } => "ScheduleNodeError",
            Outcome::BindError { .. } => "ScheduleError",
        }
    }

    /// Node named by the outcome, if one was chosen.
    pub fn node(&self) -> Option<&str> {
        match self {
            Outcome::Scheduled { node } | Outcome::BindError { node, .. } => Some(node.as_str()),
            Outcome::NodeError { .. } => None,
        }
    }

    /// Human-readable message naming the workload.
    pub fn message(&self, workload: &WorkloadRef) -> String {
        match self {
            Outcome::Scheduled { node } => {
                format!("Workload {} scheduled in node {node}", workload.name)
            }
            Outcome::NodeError { error } => format!(
                "Failed to get node information to schedule workload {}: {error}",
                workload.name
            ),
            Outcome::BindError { node, error } => {
                format!("Failed to schedule workload {} in node {node}: {error}", workload.name)
            }
        }
    }
}

/// The operations the scheduler needs from the cluster.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Commit the assignment of `workload` to `node`.
    async fn commit_binding(&self, workload: &WorkloadRef, node: &str) -> anyhow::Result<()>;

    /// Publish an outcome notification. Failures are logged, never retried.
    async fn record_outcome(&self, workload: &WorkloadRef, outcome: &Outcome) -> anyhow::Result<()>;
}
