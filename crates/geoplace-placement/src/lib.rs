//! geoplace-placement: chooses one node for one workload.
//!
//! A workload may carry a required or preferred location constraint. The
//! [`CandidateResolver`] narrows the inventory tier by tier, and an
//! [`Algorithm`] variant turns the first non-empty tier into a single node:
//!
//! - `random`: any node, ignoring location and resources
//! - `naive-location`: location cascade without resource filtering
//! - `location`: location cascade with resource filtering at every tier
//! - `metrics-location`: like `location`, but ranked first-hit within a tier

pub mod algorithm;
pub mod error;
pub mod location;
pub mod random;
pub mod ranked;
pub mod resolver;
pub mod tiered;
pub mod workload;

pub use algorithm::{Algorithm, AlgorithmKind, UnknownAlgorithm, build_algorithm};
pub use error::{PlacementError, PlacementResult};
pub use location::{LocationConstraint, LocationKind, LocationLabels};
pub use random::RandomAlgorithm;
pub use ranked::MetricsLocationAlgorithm;
pub use resolver::{CandidateResolver, CascadeStep};
pub use tiered::LocationAlgorithm;
pub use workload::{ContainerRequests, Workload};
