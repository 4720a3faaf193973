//! Registry of all interfaces of the local AS.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use beacon_core::{IfId, IfInfoMap, LinkType};

use super::interface::{IfStateConfig, Interface};

/// Concurrent map from interface id to [`Interface`].
///
/// Handles are `Arc`s, so an interface keeps its identity (and state) across
/// topology reloads for as long as its id stays in the topology.
pub struct Interfaces {
    config: IfStateConfig,
    intfs: RwLock<HashMap<IfId, Arc<Interface>>>,
}

impl Interfaces {
    /// Create the registry from the initial topology.
    pub fn new(infos: IfInfoMap, mut config: IfStateConfig) -> Self {
        config.init_defaults();
        let intfs = Self {
            config,
            intfs: RwLock::new(HashMap::new()),
        };
        intfs.update(infos);
        intfs
    }

    pub fn config(&self) -> &IfStateConfig {
        &self.config
    }

    /// Rebuild the map from a reloaded topology.
    ///
    /// Existing interfaces keep their state and only get new topology info.
    /// New ids start out `Inactive`; ids missing from `infos` are dropped.
    pub fn update(&self, infos: IfInfoMap) {
        let mut intfs = self.intfs.write();
        let mut next = HashMap::with_capacity(infos.len());
        for (ifid, info) in infos {
            match intfs.get(&ifid) {
                Some(intf) => {
                    intf.update_topo_info(info);
                    next.insert(ifid, Arc::clone(intf));
                }
                None => {
                    debug!("adding interface {ifid} ({} to {})", info.link_type, info.remote_ia);
                    next.insert(
                        ifid,
                        Arc::new(Interface::new(ifid, info, self.config.keepalive_timeout)),
                    );
                }
            }
        }
        for ifid in intfs.keys().filter(|ifid| !next.contains_key(ifid)) {
            debug!("removing interface {ifid}");
        }
        *intfs = next;
    }

    /// Reset every interface to `Inactive`. Called when this instance becomes
    /// the elected primary.
    pub fn reset(&self) {
        let intfs = self.intfs.read();
        for intf in intfs.values() {
            intf.reset();
        }
    }

    /// Snapshot of the current map.
    pub fn all(&self) -> HashMap<IfId, Arc<Interface>> {
        self.intfs.read().clone()
    }

    pub fn get(&self, ifid: IfId) -> Option<Arc<Interface>> {
        self.intfs.read().get(&ifid).cloned()
    }

    /// Ids of interfaces with the given link type, split into active and
    /// non-active. Both lists are sorted.
    pub fn filtered(&self, link_type: LinkType) -> (Vec<IfId>, Vec<IfId>) {
        let mut active = Vec::new();
        let mut inactive = Vec::new();
        for (ifid, intf) in self.all() {
            if intf.topo_info().link_type != link_type {
                continue;
            }
            if intf.is_active() {
                active.push(ifid);
            } else {
                inactive.push(ifid);
            }
        }
        active.sort_unstable();
        inactive.sort_unstable();
        (active, inactive)
    }

    pub fn len(&self) -> usize {
        self.intfs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.intfs.read().is_empty()
    }
}
