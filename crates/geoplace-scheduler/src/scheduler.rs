//! Scheduler: binds arriving workloads to nodes.
//!
//! For each workload the scheduler:
//! 1. Asks the configured algorithm for a node
//! 2. Reserves the workload's requests on the chosen node
//! 3. Commits the binding through the control plane
//! 4. Records an outcome notification, whatever happened

use std::sync::Arc;

use geoplace_inventory::{Node, NodeInventory};
use geoplace_placement::{Algorithm, Workload};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::control_plane::{ControlPlane, Outcome};
use crate::error::{SchedulerError, SchedulerResult};
use crate::workload::{RawWorkload, WorkloadRef};

/// How often one workload is re-placed after losing its node's capacity.
const MAX_PLACEMENT_ATTEMPTS: usize = 3;

/// Drives placement decisions for incoming workloads.
///
/// Cloning is cheap; every clone shares the same algorithm, inventory and
/// control plane.
#[derive(Clone)]
pub struct Scheduler {
    algorithm: Arc<dyn Algorithm>,
    inventory: NodeInventory,
    control_plane: Arc<dyn ControlPlane>,
}

impl Scheduler {
    pub fn new(
        algorithm: Arc<dyn Algorithm>,
        inventory: NodeInventory,
        control_plane: Arc<dyn ControlPlane>,
    ) -> Self {
        Self {
            algorithm,
            inventory,
            control_plane,
        }
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Place and bind one workload.
    ///
    /// The workload's requests are held on the chosen node before the
    /// binding is committed and given back if the binding is rejected.
    pub async fn schedule(&self, raw: RawWorkload) -> SchedulerResult<Node> {
        let workload_ref = raw.workload_ref();
        let workload = raw.to_workload();

        let node = match self.place(&workload_ref, &workload) {
            Ok(node) => node,
            Err(e) => {
                warn!(
                    workload = %workload_ref,
                    algorithm = self.algorithm_name(),
                    error = %e,
                    "no node for workload"
                );
                self.report(
                    &workload_ref,
                    Outcome::NodeError {
                        error: e.to_string(),
                    },
                )
                .await;
                return Err(e);
            }
        };

        info!(workload = %workload_ref, node = %node.name, "assigned workload to node");

        if let Err(e) = self.control_plane.commit_binding(&workload_ref, &node.name).await {
            error!(workload = %workload_ref, node = %node.name, error = %e, "binding rejected");
            self.inventory
                .release(&node.name, workload.requested_cpu, workload.requested_memory);
            self.report(
                &workload_ref,
                Outcome::BindError {
                    node: node.name.clone(),
                    error: e.to_string(),
                },
            )
            .await;
            return Err(SchedulerError::Bind {
                workload: workload_ref.to_string(),
                node: node.name,
                source: e,
            });
        }

        self.report(
            &workload_ref,
            Outcome::Scheduled {
                node: node.name.clone(),
            },
        )
        .await;
        Ok(node)
    }

    /// Choose a node and hold the workload's requests on it.
    ///
    /// A concurrent decision may take the capacity between the algorithm's
    /// answer and the reservation; the algorithm is then asked again against
    /// the updated inventory.
    fn place(&self, workload_ref: &WorkloadRef, workload: &Workload) -> SchedulerResult<Node> {
        for attempt in 1..=MAX_PLACEMENT_ATTEMPTS {
            let node = self.algorithm.get_node(workload)?;
            if self.hold(&node, workload) {
                return Ok(node);
            }
            debug!(
                workload = %workload_ref,
                node = %node.name,
                attempt,
                "capacity taken by a concurrent decision, retrying"
            );
        }

        Err(SchedulerError::Contended {
            workload: workload_ref.to_string(),
            attempts: MAX_PLACEMENT_ATTEMPTS,
        })
    }

    fn hold(&self, node: &Node, workload: &Workload) -> bool {
        let (cpu, memory) = (workload.requested_cpu, workload.requested_memory);
        if self.algorithm.filters_resources() {
            self.inventory.try_reserve(&node.name, cpu, memory)
        } else {
            self.inventory.reserve(&node.name, cpu, memory)
        }
    }

    /// Schedule workloads as they arrive until the stream closes or shutdown
    /// is signalled, then wait for in-flight decisions.
    pub async fn run(
        self,
        mut workloads: mpsc::Receiver<RawWorkload>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(algorithm = self.algorithm_name(), "scheduler started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                raw = workloads.recv() => match raw {
                    Some(raw) => {
                        debug!(workload = %raw.workload_ref(), "workload arrived");
                        let scheduler = self.clone();
                        tasks.spawn(async move {
                            // Failures are already logged and reported.
                            let _ = scheduler.schedule(raw).await;
                        });
                    }
                    None => {
                        debug!("workload stream closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "scheduling task panicked");
                    }
                }
                _ = shutdown.changed() => {
                    debug!("scheduler shutting down");
                    break;
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scheduling task panicked");
            }
        }

        info!("scheduler stopped");
    }

    async fn report(&self, workload: &WorkloadRef, outcome: Outcome) {
        debug!(
            workload = %workload,
            r#type = %outcome.outcome_type(),
            reason = outcome.reason(),
            "recording outcome"
        );
        if let Err(e) = self.control_plane.record_outcome(workload, &outcome).await {
            warn!(
                workload = %workload,
                reason = outcome.reason(),
                error = %e,
                "failed to record outcome"
            );
        }
    }
}
