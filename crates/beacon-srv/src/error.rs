//! Error types for the beacon server.

use std::net::SocketAddr;
use std::path::PathBuf;

use beacon_control::{ConfigError, FilterError, IfStateError, PolicyError, SendError};
use beacon_core::{FrameError, IA, IfId, SegmentError};

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("unable to read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse topology: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate interface id: {0}")]
    DuplicateInterface(IfId),

    #[error("interface id 0 is reserved")]
    ReservedInterfaceId,

    #[error("interface id {id} exceeds maximum {max}")]
    InterfaceIdOutOfRange { id: IfId, max: IfId },
}

/// Why a beacon was not added to the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("beacon filtered: {0}")]
    Filtered(#[from] FilterError),

    #[error("unable to pack beacon: {0}")]
    Segment(#[from] SegmentError),
}

/// Why an inbound frame was dropped.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("no interface to {ia} (remote interface {ifid})")]
    UnknownNeighbor { ia: IA, ifid: IfId },

    #[error("beacon addressed to {0}")]
    WrongDestination(IA),

    #[error("revocation of unknown local interface {0}")]
    UnknownInterface(IfId),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    IfState(#[from] IfStateError),
}

#[derive(Debug, thiserror::Error)]
pub enum KeepaliveError {
    #[error("unable to pack keepalive: {0}")]
    Frame(#[from] FrameError),

    #[error("{0}")]
    Send(#[from] SendError),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("invalid beaconing configuration: {0}")]
    Beaconing(#[from] ConfigError),

    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}
