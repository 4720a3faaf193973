//! Periodic keepalives to all neighbors.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::warn;

use beacon_control::{Interfaces, Sender, Task};
use beacon_core::{Frame, IA, IfId};

use crate::error::KeepaliveError;

/// Sends a keepalive on every interface, regardless of its state, so that
/// neighbors can (re)activate their side of the link.
pub struct KeepaliveEmitter<S> {
    local_ia: IA,
    intfs: Arc<Interfaces>,
    sender: Arc<S>,
}

impl<S: Sender> KeepaliveEmitter<S> {
    pub fn new(local_ia: IA, intfs: Arc<Interfaces>, sender: Arc<S>) -> Self {
        Self {
            local_ia,
            intfs,
            sender,
        }
    }

    /// Send one round of keepalives, returning the number sent.
    pub async fn emit(&self) -> usize {
        let mut all: Vec<_> = self.intfs.all().into_iter().collect();
        all.sort_unstable_by_key(|(ifid, _)| *ifid);

        let mut sent = 0;
        for (ifid, intf) in all {
            let info = intf.topo_info();
            match self.send_keepalive(ifid, info.overlay_addr).await {
                Ok(()) => sent += 1,
                Err(err) => warn!("unable to send keepalive on interface {ifid}: {err}"),
            }
        }
        sent
    }

    async fn send_keepalive(&self, ifid: IfId, addr: SocketAddr) -> Result<(), KeepaliveError> {
        let raw = Frame::Keepalive {
            origin_ia: self.local_ia,
            origin_ifid: ifid,
        }
        .pack()?;
        self.sender.send(raw, addr).await?;
        Ok(())
    }
}

impl<S: Sender> Task for KeepaliveEmitter<S> {
    fn name(&self) -> &'static str {
        "keepalive"
    }

    async fn run(&self) {
        self.emit().await;
    }
}
