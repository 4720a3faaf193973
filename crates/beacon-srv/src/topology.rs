//! Topology file loading.
//!
//! ```toml
//! [[interfaces]]
//! id = 10
//! link_type = "core"
//! remote_ia = "1-ff00:0:120"
//! local_addr = "10.0.0.1:50000"
//! overlay_addr = "10.0.0.2:30041"
//! mtu = 1472
//! ```

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use beacon_control::propagation::DEFAULT_MTU;
use beacon_core::{IA, IfId, IfInfo, IfInfoMap, LinkType};

use crate::error::TopologyError;

#[derive(Debug, Default, Deserialize)]
struct TopologyFile {
    #[serde(default)]
    interfaces: Vec<InterfaceEntry>,
}

/// An `[[interfaces]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceEntry {
    pub id: IfId,
    pub link_type: LinkType,
    pub remote_ia: IA,
    pub local_addr: SocketAddr,
    pub overlay_addr: SocketAddr,
    #[serde(default = "default_mtu")]
    pub mtu: u16,
}

fn default_mtu() -> u16 {
    DEFAULT_MTU
}

impl From<InterfaceEntry> for IfInfo {
    fn from(entry: InterfaceEntry) -> Self {
        IfInfo {
            link_type: entry.link_type,
            remote_ia: entry.remote_ia,
            remote_ifid: None,
            local_addr: entry.local_addr,
            overlay_addr: entry.overlay_addr,
            mtu: entry.mtu,
        }
    }
}

/// Load a topology file.
pub fn load(path: &Path) -> Result<IfInfoMap, TopologyError> {
    let content = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse a topology from a TOML string.
pub fn parse(s: &str) -> Result<IfInfoMap, TopologyError> {
    let file: TopologyFile = toml::from_str(s)?;
    let mut infos = IfInfoMap::with_capacity(file.interfaces.len());
    for entry in file.interfaces {
        if entry.id == IfId(0) {
            return Err(TopologyError::ReservedInterfaceId);
        }
        if entry.id > IfId::MAX {
            return Err(TopologyError::InterfaceIdOutOfRange {
                id: entry.id,
                max: IfId::MAX,
            });
        }
        let id = entry.id;
        if infos.insert(id, entry.into()).is_some() {
            return Err(TopologyError::DuplicateInterface(id));
        }
    }
    Ok(infos)
}
