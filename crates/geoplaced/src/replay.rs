//! Replay control plane: cluster events from a JSON-lines stream.
//!
//! Each non-blank line is one [`ClusterEvent`]:
//!
//! ```text
//! {"type":"node_added","node":{"name":"n1","labels":{...},"allocatable_cpu":4000}}
//! {"type":"workload_arrived","workload":{"name":"web","containers":[{"cpu":500}]}}
//! ```
//!
//! Lines starting with `#` are comments.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use geoplace_inventory::{NodeEvent, RawNode};
use geoplace_scheduler::{ControlPlane, Outcome, OutcomeType, RawWorkload, WorkloadRef};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterEvent {
    NodeAdded { node: RawNode },
    NodeUpdated { old: RawNode, new: RawNode },
    NodeDeleted { node: RawNode },
    WorkloadArrived { workload: RawWorkload },
}

/// Counts of what a feed forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub node_events: usize,
    pub workloads: usize,
    pub skipped: usize,
}

/// Forward every event in `reader` to the inventory and scheduler loops.
///
/// A workload is forwarded only once the inventory reports every earlier
/// node event as applied through `applied`. Malformed lines are logged and
/// skipped.
pub async fn feed<R>(
    reader: R,
    nodes: mpsc::Sender<NodeEvent>,
    workloads: mpsc::Sender<RawWorkload>,
    mut applied: watch::Receiver<u64>,
) -> anyhow::Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();
    let baseline = *applied.borrow();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("reading event stream")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let event: ClusterEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                error!(line = line_no, error = %e, "skipping malformed event");
                stats.skipped += 1;
                continue;
            }
        };

        let node_event = match event {
            ClusterEvent::NodeAdded { node } => NodeEvent::Added(node),
            ClusterEvent::NodeUpdated { old, new } => NodeEvent::Updated { old, new },
            ClusterEvent::NodeDeleted { node } => NodeEvent::Deleted(node),
            ClusterEvent::WorkloadArrived { workload } => {
                let sent = baseline + stats.node_events as u64;
                applied
                    .wait_for(|count| *count >= sent)
                    .await
                    .context("inventory loop stopped")?;
                workloads
                    .send(workload)
                    .await
                    .context("scheduler loop stopped")?;
                stats.workloads += 1;
                continue;
            }
        };

        nodes
            .send(node_event)
            .await
            .context("inventory loop stopped")?;
        stats.node_events += 1;
    }

    debug!(?stats, "event stream exhausted");
    Ok(stats)
}

/// Control plane that accepts every binding and logs outcomes.
#[derive(Debug, Default)]
pub struct ReplayControlPlane {
    bound: AtomicUsize,
    failed: AtomicUsize,
}

impl ReplayControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> usize {
        self.bound.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ControlPlane for ReplayControlPlane {
    async fn commit_binding(&self, workload: &WorkloadRef, node: &str) -> anyhow::Result<()> {
        info!(%workload, node, "binding committed");
        self.bound.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn record_outcome(
        &self,
        workload: &WorkloadRef,
        outcome: &Outcome,
    ) -> anyhow::Result<()> {
        let message = outcome.message(workload);
        match outcome.outcome_type() {
            OutcomeType::Normal => info!(%workload, reason = outcome.reason(), "{message}"),
            OutcomeType::Warning => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%workload, reason = outcome.reason(), "{message}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use geoplace_geo::Gazetteer;
    use geoplace_inventory::NodeInventory;

    use super::*;

    const STREAM: &str = r#"
# two nodes, one move, one workload
{"type":"node_added","node":{"name":"n1","labels":{"node-role.kubernetes.io/edge":""}}}
{"type":"node_updated","old":{"name":"n1"},"new":{"name":"n1","allocatable_cpu":10}}
not json
{"type":"workload_arrived","workload":{"name":"web","containers":[{"cpu":500,"memory":100}]}}
{"type":"node_deleted","node":{"name":"n1"}}
"#;

    #[test]
    fn parses_cluster_events() {
        let event: ClusterEvent =
            serde_json::from_str(r#"{"type":"workload_arrived","workload":{"name":"web"}}"#)
                .unwrap();
        assert_eq!(
            event,
            ClusterEvent::WorkloadArrived {
                workload: RawWorkload::new("web"),
            }
        );
    }

    fn inventory() -> NodeInventory {
        NodeInventory::new(Arc::new(Gazetteer::builtin()))
    }

    #[tokio::test]
    async fn feed_routes_events_and_skips_bad_lines() {
        let inventory = inventory();
        let (node_tx, node_rx) = mpsc::channel(16);
        let (workload_tx, mut workload_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let watcher = tokio::spawn(inventory.clone().run(node_rx, shutdown_rx));

        let stats = feed(STREAM.as_bytes(), node_tx, workload_tx, inventory.applied_events())
            .await
            .unwrap();
        assert_eq!(
            stats,
            FeedStats {
                node_events: 3,
                workloads: 1,
                skipped: 1,
            }
        );

        let workload = workload_rx.recv().await.unwrap();
        assert_eq!(workload.name, "web");
        assert_eq!(workload.containers[0].cpu, 500);

        watcher.await.unwrap();
        assert_eq!(*inventory.applied_events().borrow(), 3);
        // The update and delete carry no edge role, so n1 stays cached.
        assert_eq!(inventory.count_nodes(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn workloads_wait_for_earlier_node_events() {
        const ARRIVAL: &str = r#"
{"type":"node_added","node":{"name":"n1","labels":{"node-role.kubernetes.io/edge":""}}}
{"type":"node_updated","old":{"name":"n1","labels":{"node-role.kubernetes.io/edge":""}},"new":{"name":"n1","labels":{"node-role.kubernetes.io/edge":""},"allocatable_cpu":10}}
{"type":"workload_arrived","workload":{"name":"web"}}
"#;

        for _ in 0..50 {
            let inventory = inventory();
            let (node_tx, node_rx) = mpsc::channel(16);
            let (workload_tx, _workload_rx) = mpsc::channel(16);
            let (_shutdown_tx, shutdown_rx) = watch::channel(false);
            let watcher = tokio::spawn(inventory.clone().run(node_rx, shutdown_rx));

            feed(ARRIVAL.as_bytes(), node_tx, workload_tx, inventory.applied_events())
                .await
                .unwrap();
            assert_eq!(inventory.get("n1").map(|node| node.available_cpu), Some(10));

            watcher.await.unwrap();
        }
    }

    #[tokio::test]
    async fn replay_control_plane_counts_outcomes() {
        let control_plane = ReplayControlPlane::new();
        let workload = RawWorkload::new("web").workload_ref();

        control_plane.commit_binding(&workload, "n1").await.unwrap();
        control_plane
            .record_outcome(
                &workload,
                &Outcome::Scheduled {
                    node: "n1".to_string(),
                },
            )
            .await
            .unwrap();
        control_plane
            .record_outcome(
                &workload,
                &Outcome::NodeError {
                    error: "no nodes are available".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(control_plane.bound(), 1);
        assert_eq!(control_plane.failed(), 1);
    }
}
