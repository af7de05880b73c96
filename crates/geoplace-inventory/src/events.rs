//! Node lifecycle events and the single-writer loop that applies them.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::inventory::NodeInventory;
use crate::node::RawNode;

/// A node lifecycle notification from the cluster control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeEvent {
    Added(RawNode),
    Updated { old: RawNode, new: RawNode },
    Deleted(RawNode),
}

impl NodeEvent {
    /// Name of the node the event concerns.
    pub fn node_name(&self) -> &str {
        match self {
            NodeEvent::Added(raw) | NodeEvent::Deleted(raw) => &raw.name,
            NodeEvent::Updated { new, .. } => &new.name,
        }
    }
}

impl NodeInventory {
    /// Apply one lifecycle event.
    pub fn apply(&self, event: &NodeEvent) {
        match event {
            NodeEvent::Added(raw) => self.apply_add(raw),
            NodeEvent::Updated { old, new } => self.apply_update(old, new),
            NodeEvent::Deleted(raw) => self.apply_delete(raw),
        }
        self.applied.send_modify(|count| *count += 1);
    }

    /// Number of events passed through [`apply`](Self::apply) so far.
    ///
    /// The count is bumped only after the event is fully visible to readers.
    pub fn applied_events(&self) -> watch::Receiver<u64> {
        self.applied.subscribe()
    }

    /// Apply events in arrival order until the channel closes or shutdown
    /// is signalled.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<NodeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("node inventory watcher started");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        debug!(node = event.node_name(), "applying node event");
                        self.apply(&event);
                    }
                    None => {
                        debug!("node event stream closed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("node inventory watcher shutting down");
                    break;
                }
            }
        }

        info!(nodes = self.count_nodes(), "node inventory watcher stopped");
    }
}
