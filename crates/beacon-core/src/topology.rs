//! Static per-interface topology information.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::addr::IA;

/// Identifier of a local inter-AS interface. Zero is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IfId(pub u64);

impl IfId {
    /// Largest id that fits the 16-bit wire encoding.
    pub const MAX: IfId = IfId(u16::MAX as u64);
}

impl fmt::Display for IfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relationship between the local AS and the neighbor behind an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LinkType {
    Core = 1,
    Parent = 2,
    Child = 3,
    Peer = 4,
}

impl LinkType {
    /// Convert from the wire byte.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(LinkType::Core),
            2 => Some(LinkType::Parent),
            3 => Some(LinkType::Child),
            4 => Some(LinkType::Peer),
            _ => None,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkType::Core => "core",
            LinkType::Parent => "parent",
            LinkType::Child => "child",
            LinkType::Peer => "peer",
        };
        f.write_str(s)
    }
}

/// Topology view of one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfInfo {
    pub link_type: LinkType,
    /// AS on the other side of the link.
    pub remote_ia: IA,
    /// Interface id on the remote side. Learned from keepalives, not topology.
    pub remote_ifid: Option<IfId>,
    /// Local address of the link endpoint.
    pub local_addr: SocketAddr,
    /// Transport address used to reach the neighbor over this link.
    pub overlay_addr: SocketAddr,
    pub mtu: u16,
}

pub type IfInfoMap = HashMap<IfId, IfInfo>;
