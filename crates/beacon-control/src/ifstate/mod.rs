//! Per-interface liveness state and the interface registry.
//!
//! Each [`Interface`] runs a small state machine driven by keepalives,
//! keepalive timeouts and revocations. The [`Interfaces`] registry owns all of
//! them and keeps their state across topology reloads.

pub mod constants;
pub mod interface;
pub mod registry;
pub mod sweep;

pub use constants::*;
pub use interface::{IfStateConfig, Interface, InterfaceState};
pub use registry::Interfaces;
pub use sweep::ExpirySweeper;
