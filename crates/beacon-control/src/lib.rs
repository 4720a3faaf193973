//! Control plane of a beacon server.
//!
//! This crate tracks the liveness of the local AS's interfaces, decides which
//! beacons are admissible, and propagates beacons to neighboring ASes. I/O is
//! delegated to the collaborator traits in [`propagation`].

pub mod error;
pub mod ifstate;
pub mod periodic;
pub mod policy;
pub mod propagation;

pub use error::{
    ConfigError, ExtendError, FilterError, IfStateError, PolicyError, PropagationError,
    ProviderError, SendError,
};
pub use ifstate::{ExpirySweeper, IfStateConfig, Interface, InterfaceState, Interfaces};
pub use periodic::{Task, spawn_periodic};
pub use policy::{Filter, Policy, PolicyType};
pub use propagation::{
    BeaconOutcome, BeaconProvider, HopFieldExtender, Propagator, PropagatorConfig, RunReport,
    SegmentExtender, Sender,
};
