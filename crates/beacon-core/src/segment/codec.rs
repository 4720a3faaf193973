//! Canonical binary encoding of path segments.
//!
//! Layout (big-endian):
//!
//! ```text
//! segment  = timestamp:u32 seg_id:u16 n_entries:u8 entry*
//! entry    = local:IA next:IA mtu:u16 hop n_peers:u8 peer* sig_len:u16 sig
//! peer     = peer_ia:IA peer_ifid:u16 peer_mtu:u16 hop
//! hop      = exp_time:u8 ingress:u16 egress:u16 mac:[u8; 6]
//! IA       = isd:u16 asn:u48
//! ```

use super::types::{AsEntry, HopField, MAC_LEN, PathSegment, PeerEntry};
use crate::addr::IA;
use crate::error::SegmentError;
use crate::wire::{Reader, put_count, put_ifid};

/// Fixed-size segment header.
pub const SEGMENT_HEADER_SIZE: usize = 4 + 2 + 1;

/// Packed size of a hop field.
pub const HOP_FIELD_SIZE: usize = 1 + 2 + 2 + MAC_LEN;

impl PathSegment {
    /// Encode into the canonical byte form.
    pub fn pack(&self) -> Result<Vec<u8>, SegmentError> {
        let mut out = Vec::with_capacity(SEGMENT_HEADER_SIZE + self.as_entries.len() * 64);
        self.pack_into(&mut out)?;
        Ok(out)
    }

    /// Append the canonical byte form to `out`.
    pub fn pack_into(&self, out: &mut Vec<u8>) -> Result<(), SegmentError> {
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.seg_id.to_be_bytes());
        put_count(out, "AS entries", self.as_entries.len())?;
        for entry in &self.as_entries {
            pack_entry(entry, out)?;
        }
        Ok(())
    }

    /// Decode a segment, rejecting truncated input, trailing bytes and
    /// segments without entries.
    pub fn unpack(raw: &[u8]) -> Result<Self, SegmentError> {
        let mut r = Reader::new(raw);
        let segment = read_segment(&mut r)?;
        r.finish()?;
        Ok(segment)
    }
}

pub(crate) fn read_segment(r: &mut Reader<'_>) -> Result<PathSegment, SegmentError> {
    let timestamp = r.read_u32()?;
    let seg_id = r.read_u16()?;
    let n_entries = r.read_u8()?;
    if n_entries == 0 {
        return Err(SegmentError::Empty);
    }
    let mut as_entries = Vec::with_capacity(usize::from(n_entries));
    for _ in 0..n_entries {
        as_entries.push(read_entry(r)?);
    }
    Ok(PathSegment {
        timestamp,
        seg_id,
        as_entries,
    })
}

fn pack_entry(entry: &AsEntry, out: &mut Vec<u8>) -> Result<(), SegmentError> {
    out.extend_from_slice(&entry.local.to_u64().to_be_bytes());
    out.extend_from_slice(&entry.next.to_u64().to_be_bytes());
    out.extend_from_slice(&entry.mtu.to_be_bytes());
    pack_hop_field(&entry.hop_field, out)?;
    put_count(out, "peer entries", entry.peers.len())?;
    for peer in &entry.peers {
        out.extend_from_slice(&peer.peer_ia.to_u64().to_be_bytes());
        put_ifid(out, peer.peer_ifid)?;
        out.extend_from_slice(&peer.peer_mtu.to_be_bytes());
        pack_hop_field(&peer.hop_field, out)?;
    }
    let sig_len = u16::try_from(entry.signature.len())
        .map_err(|_| SegmentError::SignatureTooLong(entry.signature.len()))?;
    out.extend_from_slice(&sig_len.to_be_bytes());
    out.extend_from_slice(&entry.signature);
    Ok(())
}

fn read_entry(r: &mut Reader<'_>) -> Result<AsEntry, SegmentError> {
    let local = IA::from_u64(r.read_u64()?);
    let next = IA::from_u64(r.read_u64()?);
    let mtu = r.read_u16()?;
    let hop_field = read_hop_field(r)?;
    let n_peers = r.read_u8()?;
    let mut peers = Vec::with_capacity(usize::from(n_peers));
    for _ in 0..n_peers {
        peers.push(PeerEntry {
            peer_ia: IA::from_u64(r.read_u64()?),
            peer_ifid: r.read_ifid()?,
            peer_mtu: r.read_u16()?,
            hop_field: read_hop_field(r)?,
        });
    }
    let sig_len = r.read_u16()?;
    let signature = r.take(usize::from(sig_len))?.to_vec();
    Ok(AsEntry {
        local,
        next,
        mtu,
        hop_field,
        peers,
        signature,
    })
}

/// Append a hop field.
pub fn pack_hop_field(hop: &HopField, out: &mut Vec<u8>) -> Result<(), SegmentError> {
    out.push(hop.exp_time);
    put_ifid(out, hop.cons_ingress)?;
    put_ifid(out, hop.cons_egress)?;
    out.extend_from_slice(&hop.mac);
    Ok(())
}

fn read_hop_field(r: &mut Reader<'_>) -> Result<HopField, SegmentError> {
    let exp_time = r.read_u8()?;
    let cons_ingress = r.read_ifid()?;
    let cons_egress = r.read_ifid()?;
    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(r.take(MAC_LEN)?);
    Ok(HopField {
        exp_time,
        cons_ingress,
        cons_egress,
        mac,
    })
}
