//! Handling of control frames received from neighbors.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{debug, info, trace};

use beacon_control::{Interface, InterfaceState, Interfaces};
use beacon_core::{Beacon, Frame, IA, IfId, SignedRevInfo};

use crate::error::HandlerError;
use crate::store::BeaconStore;

/// What an accepted frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Beacon stored for propagation, or dropped as a duplicate.
    Beacon { ifid: IfId, stored: bool },
    /// Interface activated; carries the state it was in before.
    Keepalive { ifid: IfId, prev: InterfaceState },
    Revocation { ifid: IfId },
}

/// Dispatches inbound frames to the interface registry and the beacon store.
pub struct InboundHandler {
    local_ia: IA,
    intfs: Arc<Interfaces>,
    store: Arc<BeaconStore>,
}

impl InboundHandler {
    pub fn new(local_ia: IA, intfs: Arc<Interfaces>, store: Arc<BeaconStore>) -> Self {
        Self {
            local_ia,
            intfs,
            store,
        }
    }

    pub fn handle(&self, raw: &[u8], from: SocketAddr) -> Result<Handled, HandlerError> {
        let frame = Frame::parse(raw)?;
        trace!("received frame type {:#04x} from {from}", frame.frame_type());
        match frame {
            Frame::Beacon {
                src_ia,
                dst_ia,
                egress_ifid,
                segment,
            } => {
                if dst_ia != self.local_ia {
                    return Err(HandlerError::WrongDestination(dst_ia));
                }
                let intf = self.neighbor(src_ia, egress_ifid)?;
                let beacon = Beacon::new(segment, intf.ifid());
                debug!("received beacon {beacon}");
                let stored = self.store.insert(beacon)?;
                Ok(Handled::Beacon {
                    ifid: intf.ifid(),
                    stored,
                })
            }
            Frame::Keepalive {
                origin_ia,
                origin_ifid,
            } => {
                let intf = self.neighbor(origin_ia, origin_ifid)?;
                let prev = intf.activate(origin_ifid);
                match prev {
                    InterfaceState::Active => {}
                    InterfaceState::Revoked => {
                        info!("interface {} activated, revocation cleared", intf.ifid());
                    }
                    _ => info!("interface {} activated (was {prev})", intf.ifid()),
                }
                Ok(Handled::Keepalive {
                    ifid: intf.ifid(),
                    prev,
                })
            }
            Frame::Revocation(rev) => self.handle_revocation(rev),
        }
    }

    fn handle_revocation(&self, rev: SignedRevInfo) -> Result<Handled, HandlerError> {
        // Revocations name the interface from the issuer's point of view
        let intf = if rev.info.ia == self.local_ia {
            self.intfs
                .get(rev.info.ifid)
                .ok_or(HandlerError::UnknownInterface(rev.info.ifid))?
        } else {
            self.neighbor(rev.info.ia, rev.info.ifid)?
        };
        let ifid = intf.ifid();
        intf.revoke(rev)?;
        info!("interface {ifid} revoked");
        Ok(Handled::Revocation { ifid })
    }

    /// The local interface facing `remote_ifid` of `remote_ia`.
    ///
    /// An interface that already learned its remote id must match it exactly;
    /// otherwise the first one to `remote_ia` that has not learned it yet is
    /// used.
    fn neighbor(&self, remote_ia: IA, remote_ifid: IfId) -> Result<Arc<Interface>, HandlerError> {
        let mut candidates: Vec<(IfId, Arc<Interface>)> = self
            .intfs
            .all()
            .into_iter()
            .filter(|(_, intf)| intf.topo_info().remote_ia == remote_ia)
            .collect();
        candidates.sort_unstable_by_key(|(ifid, _)| *ifid);

        let exact = candidates
            .iter()
            .find(|(_, intf)| intf.topo_info().remote_ifid == Some(remote_ifid));
        let unlearned = candidates
            .iter()
            .find(|(_, intf)| intf.topo_info().remote_ifid.is_none());
        exact
            .or(unlearned)
            .map(|(_, intf)| Arc::clone(intf))
            .ok_or(HandlerError::UnknownNeighbor {
                ia: remote_ia,
                ifid: remote_ifid,
            })
    }
}
