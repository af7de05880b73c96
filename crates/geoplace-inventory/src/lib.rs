//! geoplace-inventory: the node inventory consulted by every placement.
//!
//! Keeps a consistent, queryable snapshot of the cluster's edge nodes,
//! indexed by canonical city, country and continent codes, and kept current
//! by a single writer applying node lifecycle events in arrival order.
//!
//! # Architecture
//!
//! ```text
//! NodeEvent stream ──► NodeInventory::run (single writer)
//!                         │  one write lock per add/update/delete
//!                         ▼
//!                  ┌─────────────────────────────┐
//!                  │ primary: name → Node        │
//!                  │ cities: PT-03 → [names]     │
//!                  │ countries: PT → [names]     │
//!                  │ continents: EU → [names]    │
//!                  └─────────────────────────────┘
//!                         ▲  read lock, owned snapshots
//!                  placement queries (many readers)
//! ```

pub mod error;
pub mod events;
pub mod filter;
pub mod inventory;
pub mod node;

pub use error::{LookupError, LookupResult};
pub use events::NodeEvent;
pub use filter::{NodeFilter, matches};
pub use inventory::{GeoTier, IndexStats, NodeInventory};
pub use node::{LabelKeys, Node, RawNode};
