//! Segment data model.

use crate::addr::IA;
use crate::topology::IfId;

/// Length of a truncated hop-field MAC in bytes.
pub const MAC_LEN: usize = 6;

/// Forwarding information for one AS, authenticated by the AS that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopField {
    /// Relative expiration time, in units defined by the forwarding plane.
    pub exp_time: u8,
    /// Ingress interface in construction direction (`IfId(0)` at the origin).
    pub cons_ingress: IfId,
    /// Egress interface in construction direction.
    pub cons_egress: IfId,
    pub mac: [u8; MAC_LEN],
}

/// Peering link advertised alongside a regular AS entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub peer_ia: IA,
    pub peer_ifid: IfId,
    pub peer_mtu: u16,
    pub hop_field: HopField,
}

/// One AS worth of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsEntry {
    /// The AS that created this entry.
    pub local: IA,
    /// The AS the segment was sent to next.
    pub next: IA,
    pub mtu: u16,
    pub hop_field: HopField,
    pub peers: Vec<PeerEntry>,
    /// Signature over the segment up to and including this entry. Empty when unsigned.
    pub signature: Vec<u8>,
}

/// An ordered list of AS entries, origin first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Creation time at the originating AS (seconds since the Unix epoch).
    pub timestamp: u32,
    /// Random identifier chosen by the originating AS.
    pub seg_id: u16,
    pub as_entries: Vec<AsEntry>,
}

impl PathSegment {
    /// Create a segment with no entries yet.
    pub fn new(timestamp: u32, seg_id: u16) -> Self {
        Self {
            timestamp,
            seg_id,
            as_entries: Vec::new(),
        }
    }

    /// Number of AS entries (hops) in the segment.
    pub fn len(&self) -> usize {
        self.as_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_entries.is_empty()
    }

    /// Whether any AS entry was created by `ia`.
    pub fn contains_ia(&self, ia: IA) -> bool {
        self.as_entries.iter().any(|entry| entry.local == ia)
    }

    /// The AS that originated the segment.
    pub fn first_ia(&self) -> Option<IA> {
        self.as_entries.first().map(|entry| entry.local)
    }

    /// The AS that most recently extended the segment.
    pub fn last_ia(&self) -> Option<IA> {
        self.as_entries.last().map(|entry| entry.local)
    }

    /// MAC of the last hop field, chained into the next one.
    pub fn last_mac(&self) -> Option<[u8; MAC_LEN]> {
        self.as_entries.last().map(|entry| entry.hop_field.mac)
    }

    /// Iterate over the ASes on the segment, origin first.
    pub fn ias(&self) -> impl Iterator<Item = IA> + '_ {
        self.as_entries.iter().map(|entry| entry.local)
    }
}
