//! geoplace-scheduler: turns arriving workloads into node bindings.
//!
//! The [`Scheduler`] consults a placement [`Algorithm`](geoplace_placement::Algorithm)
//! for each workload, commits the decision through a [`ControlPlane`] and
//! reports an [`Outcome`] notification for every attempt.

pub mod control_plane;
pub mod error;
pub mod scheduler;
pub mod workload;

pub use control_plane::{ControlPlane, Outcome, OutcomeType};
pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::Scheduler;
pub use workload::{RawWorkload, WorkloadRef};
