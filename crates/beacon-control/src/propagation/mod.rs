//! Beacon propagation.
//!
//! Every pass, the [`Propagator`] pulls the selected beacons from a
//! [`BeaconProvider`], extends each of them once per eligible egress
//! interface and hands the resulting frames to a [`Sender`].

pub mod config;
pub mod extender;
pub mod propagator;
pub mod traits;

pub use config::{DEFAULT_MAX_EXP_TIME, DEFAULT_MTU, ExtenderConfig, MIN_MTU, PropagatorConfig};
pub use extender::HopFieldExtender;
pub use propagator::{BeaconOutcome, Propagator, RunReport};
pub use traits::{BeaconProvider, BeaconStream, SegmentExtender, Sender};
