//! Interface state machine.
//!
//! ```text
//! Inactive ──activate──▶ Active ──expire──▶ Expired
//!    ▲                     ▲  │                │
//!    │                     └──┼──activate──────┤
//!    │                        │                │
//!    └──────reset─────── Revoked ◀──revoke─────┘ (from any non-Active state)
//! ```
//!
//! A revocation never overrides `Active`: a keepalive that arrives while the
//! revocation is in flight proves the link is up, so the revocation is stale.

use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use beacon_core::{IfId, IfInfo, SignedRevInfo};

use super::constants::{DEFAULT_KEEPALIVE_INTERVAL, KEEPALIVE_TIMEOUT_FACTOR};
use crate::error::IfStateError;

/// Lifecycle state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceState {
    /// Not activated yet, or reset.
    Inactive,
    /// Keepalives are being received.
    Active,
    /// No keepalive within the keepalive timeout.
    Expired,
    /// Explicitly revoked.
    Revoked,
}

impl fmt::Display for InterfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterfaceState::Inactive => "Inactive",
            InterfaceState::Active => "Active",
            InterfaceState::Expired => "Expired",
            InterfaceState::Revoked => "Revoked",
        };
        f.write_str(s)
    }
}

/// Liveness configuration shared by all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfStateConfig {
    /// Time between keepalives sent to each neighbor.
    pub keepalive_interval: Duration,
    /// Time without keepalives after which an interface expires.
    pub keepalive_timeout: Duration,
}

impl IfStateConfig {
    /// Fill unset (zero) fields with defaults. The timeout defaults to a
    /// multiple of the keepalive interval.
    pub fn init_defaults(&mut self) {
        if self.keepalive_interval.is_zero() {
            self.keepalive_interval = DEFAULT_KEEPALIVE_INTERVAL;
        }
        if self.keepalive_timeout.is_zero() {
            self.keepalive_timeout = self.keepalive_interval * KEEPALIVE_TIMEOUT_FACTOR;
        }
    }
}

impl Default for IfStateConfig {
    fn default() -> Self {
        let mut cfg = Self {
            keepalive_interval: Duration::ZERO,
            keepalive_timeout: Duration::ZERO,
        };
        cfg.init_defaults();
        cfg
    }
}

struct InterfaceInner {
    topo_info: IfInfo,
    state: InterfaceState,
    revocation: Option<SignedRevInfo>,
    last_activate: Instant,
}

/// Mutable state of one interface, guarded by its own lock.
pub struct Interface {
    ifid: IfId,
    keepalive_timeout: Duration,
    inner: RwLock<InterfaceInner>,
}

impl Interface {
    /// Create an interface in state `Inactive`, with the timeout window
    /// starting now.
    pub(crate) fn new(ifid: IfId, topo_info: IfInfo, keepalive_timeout: Duration) -> Self {
        Self {
            ifid,
            keepalive_timeout,
            inner: RwLock::new(InterfaceInner {
                topo_info,
                state: InterfaceState::Inactive,
                revocation: None,
                last_activate: Instant::now(),
            }),
        }
    }

    pub fn ifid(&self) -> IfId {
        self.ifid
    }

    /// Mark the interface active after a keepalive from `remote`.
    ///
    /// Clears any revocation and returns the state that was overwritten, so
    /// callers can notice a revocation being lifted.
    pub fn activate(&self, remote: IfId) -> InterfaceState {
        let mut inner = self.inner.write();
        let prev = inner.state;
        inner.state = InterfaceState::Active;
        inner.last_activate = Instant::now();
        inner.topo_info.remote_ifid = Some(remote);
        inner.revocation = None;
        prev
    }

    /// Expire the interface if no keepalive arrived within the timeout.
    ///
    /// Returns whether the interface is expired or revoked when the call
    /// returns. Already expired or revoked interfaces are left untouched.
    pub fn expire(&self) -> bool {
        let mut inner = self.inner.write();
        if matches!(
            inner.state,
            InterfaceState::Expired | InterfaceState::Revoked
        ) {
            return true;
        }
        if inner.last_activate.elapsed() > self.keepalive_timeout {
            inner.state = InterfaceState::Expired;
            return true;
        }
        false
    }

    /// Revoke the interface.
    ///
    /// Fails without changing anything if the interface is `Active`.
    pub fn revoke(&self, revocation: SignedRevInfo) -> Result<(), IfStateError> {
        let mut inner = self.inner.write();
        if inner.state == InterfaceState::Active {
            return Err(IfStateError::ActivatedInMeantime { ifid: self.ifid });
        }
        inner.state = InterfaceState::Revoked;
        inner.revocation = Some(revocation);
        Ok(())
    }

    /// Force the interface back to `Inactive` and restart the timeout window.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.state = InterfaceState::Inactive;
        inner.revocation = None;
        inner.last_activate = Instant::now();
    }

    pub fn topo_info(&self) -> IfInfo {
        self.inner.read().topo_info.clone()
    }

    pub fn state(&self) -> InterfaceState {
        self.inner.read().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == InterfaceState::Active
    }

    pub fn revocation(&self) -> Option<SignedRevInfo> {
        self.inner.read().revocation.clone()
    }

    /// Time of the last activation or reset.
    pub fn last_activate(&self) -> Instant {
        self.inner.read().last_activate
    }

    /// Replace the static topology information, keeping the remote interface
    /// id learned from keepalives.
    pub(crate) fn update_topo_info(&self, mut topo_info: IfInfo) {
        let mut inner = self.inner.write();
        topo_info.remote_ifid = inner.topo_info.remote_ifid;
        inner.topo_info = topo_info;
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Interface")
            .field("ifid", &self.ifid)
            .field("state", &inner.state)
            .field("link_type", &inner.topo_info.link_type)
            .field("remote_ia", &inner.topo_info.remote_ia)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use beacon_core::{LinkType, RevInfo};
    use std::sync::Arc;

    pub(crate) fn info(link_type: LinkType, remote: &str) -> IfInfo {
        IfInfo {
            link_type,
            remote_ia: remote.parse().unwrap(),
            remote_ifid: None,
            local_addr: "127.0.0.1:50000".parse().unwrap(),
            overlay_addr: "127.0.0.1:50001".parse().unwrap(),
            mtu: 1472,
        }
    }

    pub(crate) fn rev(ifid: u64) -> SignedRevInfo {
        SignedRevInfo {
            info: RevInfo {
                ifid: IfId(ifid),
                ia: "1-ff00:0:110".parse().unwrap(),
                link_type: LinkType::Core,
                timestamp: 1000,
                ttl_secs: 10,
            },
            signature: vec![0xAB; 8],
        }
    }

    fn intf() -> Interface {
        Interface::new(
            IfId(1),
            info(LinkType::Core, "1-ff00:0:120"),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn test_config_defaults() {
        let cfg = IfStateConfig::default();
        assert_eq!(cfg.keepalive_interval, Duration::from_secs(1));
        assert_eq!(cfg.keepalive_timeout, Duration::from_secs(3));

        let mut cfg = IfStateConfig {
            keepalive_interval: Duration::from_millis(200),
            keepalive_timeout: Duration::ZERO,
        };
        cfg.init_defaults();
        assert_eq!(cfg.keepalive_timeout, Duration::from_millis(600));

        let mut cfg = IfStateConfig {
            keepalive_interval: Duration::from_millis(200),
            keepalive_timeout: Duration::from_secs(10),
        };
        cfg.init_defaults();
        assert_eq!(cfg.keepalive_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_new_interface_is_inactive() {
        let intf = intf();
        assert_eq!(intf.state(), InterfaceState::Inactive);
        assert!(intf.revocation().is_none());
        assert_eq!(intf.topo_info().remote_ifid, None);
    }

    #[test]
    fn test_activate_returns_previous_state() {
        let intf = intf();
        assert_eq!(intf.activate(IfId(42)), InterfaceState::Inactive);
        assert_eq!(intf.activate(IfId(42)), InterfaceState::Active);
        assert_eq!(intf.state(), InterfaceState::Active);
        assert_eq!(intf.topo_info().remote_ifid, Some(IfId(42)));
    }

    #[test]
    fn test_activate_clears_revocation() {
        let intf = intf();
        intf.revoke(rev(1)).unwrap();
        assert_eq!(intf.state(), InterfaceState::Revoked);

        assert_eq!(intf.activate(IfId(2)), InterfaceState::Revoked);
        assert!(intf.revocation().is_none());
        assert_eq!(intf.state(), InterfaceState::Active);
    }

    #[test]
    fn test_revoke_active_interface_fails() {
        let intf = intf();
        intf.activate(IfId(2));
        let err = intf.revoke(rev(1)).unwrap_err();
        assert_eq!(err, IfStateError::ActivatedInMeantime { ifid: IfId(1) });
        assert_eq!(intf.state(), InterfaceState::Active);
        assert!(intf.revocation().is_none());
    }

    #[test]
    fn test_revoke_non_active_states() {
        let intf = intf();
        intf.revoke(rev(1)).unwrap();
        assert_eq!(intf.revocation(), Some(rev(1)));

        // Revoking a revoked interface replaces the record
        let mut newer = rev(1);
        newer.info.timestamp = 2000;
        intf.revoke(newer.clone()).unwrap();
        assert_eq!(intf.revocation(), Some(newer));
    }

    #[test]
    fn test_reset_clears_everything() {
        let intf = intf();
        intf.revoke(rev(1)).unwrap();
        intf.reset();
        assert_eq!(intf.state(), InterfaceState::Inactive);
        assert!(intf.revocation().is_none());
    }

    #[test]
    fn test_update_topo_info_keeps_remote_ifid() {
        let intf = intf();
        intf.activate(IfId(77));

        let mut fresh = info(LinkType::Child, "1-ff00:0:130");
        fresh.mtu = 1280;
        intf.update_topo_info(fresh);

        let topo = intf.topo_info();
        assert_eq!(topo.link_type, LinkType::Child);
        assert_eq!(topo.mtu, 1280);
        assert_eq!(topo.remote_ifid, Some(IfId(77)));
        assert_eq!(intf.state(), InterfaceState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_after_timeout() {
        let intf = intf();
        intf.activate(IfId(2));

        tokio::time::advance(Duration::from_secs(3)).await;
        // Strictly greater than the timeout is required
        assert!(!intf.expire());
        assert_eq!(intf.state(), InterfaceState::Active);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(intf.expire());
        assert_eq!(intf.state(), InterfaceState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_inactive_interface() {
        let intf = intf();
        assert!(!intf.expire());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(intf.expire());
        assert_eq!(intf.state(), InterfaceState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_is_idempotent() {
        let intf = intf();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(intf.expire());
        let last = intf.last_activate();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(intf.expire());
            assert_eq!(intf.state(), InterfaceState::Expired);
            assert_eq!(intf.last_activate(), last);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_on_revoked_reports_true() {
        let intf = intf();
        intf.revoke(rev(1)).unwrap();
        assert!(intf.expire());
        assert_eq!(intf.state(), InterfaceState::Revoked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_interface_reactivates() {
        let intf = intf();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(intf.expire());
        assert_eq!(intf.activate(IfId(2)), InterfaceState::Expired);
        assert!(!intf.expire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restarts_timeout_window() {
        let intf = intf();
        tokio::time::advance(Duration::from_secs(4)).await;
        intf.reset();
        assert!(!intf.expire());
        assert_eq!(intf.state(), InterfaceState::Inactive);
    }

    #[test]
    fn test_concurrent_activate_and_revoke_never_leaves_revocation_on_active() {
        for _ in 0..200 {
            let intf = Arc::new(intf());
            let a = Arc::clone(&intf);
            let r = Arc::clone(&intf);

            let activator = std::thread::spawn(move || {
                a.activate(IfId(9));
            });
            let revoker = std::thread::spawn(move || r.revoke(rev(1)));

            activator.join().unwrap();
            let revoked = revoker.join().unwrap();

            let state = intf.state();
            let revocation = intf.revocation();
            if revocation.is_some() {
                assert_eq!(state, InterfaceState::Revoked);
            }
            // Whichever ran last decides; a revoke that lost to activate is rejected.
            match revoked {
                Ok(()) => assert!(
                    state == InterfaceState::Active || state == InterfaceState::Revoked
                ),
                Err(IfStateError::ActivatedInMeantime { .. }) => {
                    assert_eq!(state, InterfaceState::Active);
                    assert!(revocation.is_none());
                }
            }
        }
    }
}
