//! Periodic keepalive-timeout sweep.

use std::sync::Arc;

use tracing::info;

use beacon_core::IfId;

use super::interface::InterfaceState;
use super::registry::Interfaces;
use crate::periodic::Task;

/// Expires interfaces that have not seen a keepalive within the timeout.
pub struct ExpirySweeper {
    intfs: Arc<Interfaces>,
}

impl ExpirySweeper {
    pub fn new(intfs: Arc<Interfaces>) -> Self {
        Self { intfs }
    }

    /// Run `expire` on every interface and return the ids that transitioned
    /// to `Expired` during this sweep.
    pub fn sweep(&self) -> Vec<IfId> {
        let mut all: Vec<_> = self.intfs.all().into_iter().collect();
        all.sort_unstable_by_key(|(ifid, _)| *ifid);

        let mut expired = Vec::new();
        for (ifid, intf) in all {
            let before = intf.state();
            if intf.expire()
                && !matches!(before, InterfaceState::Expired | InterfaceState::Revoked)
            {
                info!("interface {ifid} expired (was {before})");
                expired.push(ifid);
            }
        }
        expired
    }
}

impl Task for ExpirySweeper {
    fn name(&self) -> &'static str {
        "expiry_sweeper"
    }

    async fn run(&self) {
        self.sweep();
    }
}
