//! Collaborators of the propagator.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use beacon_core::{Beacon, IfId, PathSegment};

use crate::error::{ExtendError, ProviderError, SendError};

/// Beacons selected for one propagation pass. A provider closes the channel
/// once it has produced all of them.
pub type BeaconStream = mpsc::Receiver<Result<Beacon, ProviderError>>;

/// Source of the beacons to propagate.
pub trait BeaconProvider: Send + Sync + 'static {
    /// Start streaming the beacons for one pass.
    ///
    /// An error here aborts the whole pass. Errors delivered through the
    /// stream only skip the affected beacon.
    fn beacons_to_propagate(
        &self,
    ) -> impl Future<Output = Result<BeaconStream, ProviderError>> + Send;
}

/// Appends the local AS entry to a segment.
pub trait SegmentExtender: Send + Sync + 'static {
    /// Extend `segment` for propagation from `ingress` out of `egress`,
    /// advertising the given peering interfaces.
    fn extend(
        &self,
        segment: &mut PathSegment,
        ingress: IfId,
        egress: IfId,
        peers: &[IfId],
    ) -> Result<(), ExtendError>;
}

/// One-hop transport to neighboring beacon servers.
pub trait Sender: Send + Sync + 'static {
    fn send(
        &self,
        msg: Vec<u8>,
        addr: SocketAddr,
    ) -> impl Future<Output = Result<(), SendError>> + Send;
}
