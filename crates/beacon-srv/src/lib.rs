//! Beacon server.
//!
//! Wires the control plane to a UDP socket: neighbors' keepalives and
//! revocations drive the interface registry, received beacons are stored as
//! candidates, and the propagator forwards the best of them every period.

pub mod config;
pub mod error;
pub mod handler;
pub mod keepalive;
pub mod logging;
pub mod onehop;
pub mod server;
pub mod store;
pub mod topology;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::{Server, ShutdownHandle};
pub use store::BeaconStore;
