//! Default segment extension: MAC-chained hop fields and optional signatures.

use std::sync::Arc;

use ed25519_dalek::Signer;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use beacon_core::{AsEntry, HopField, IfId, MAC_LEN, PathSegment, PeerEntry, SegmentError};

use super::config::ExtenderConfig;
use super::traits::SegmentExtender;
use crate::error::{ConfigError, ExtendError};
use crate::ifstate::Interfaces;

type HmacSha256 = Hmac<Sha256>;

/// Compute the truncated MAC of a hop field.
///
/// Covers `timestamp ‖ seg_id ‖ exp_time ‖ ingress ‖ egress ‖ prev_mac`, so
/// every hop field is bound to the one before it.
pub fn hop_field_mac(
    key: &[u8],
    timestamp: u32,
    seg_id: u16,
    exp_time: u8,
    ingress: IfId,
    egress: IfId,
    prev_mac: &[u8; MAC_LEN],
) -> Result<[u8; MAC_LEN], SegmentError> {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(&timestamp.to_be_bytes());
    mac.update(&seg_id.to_be_bytes());
    mac.update(&[exp_time]);
    mac.update(&wire_ifid(ingress)?.to_be_bytes());
    mac.update(&wire_ifid(egress)?.to_be_bytes());
    mac.update(prev_mac);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&digest[..MAC_LEN]);
    Ok(out)
}

fn wire_ifid(ifid: IfId) -> Result<u16, SegmentError> {
    u16::try_from(ifid.0).map_err(|_| SegmentError::IfIdOutOfRange(ifid))
}

/// [`SegmentExtender`] that appends one AS entry built from the interface
/// registry.
pub struct HopFieldExtender {
    config: ExtenderConfig,
    intfs: Arc<Interfaces>,
}

impl HopFieldExtender {
    pub fn new(mut config: ExtenderConfig, intfs: Arc<Interfaces>) -> Result<Self, ConfigError> {
        config.init_defaults();
        config.validate()?;
        Ok(Self { config, intfs })
    }

    fn hop_field(
        &self,
        segment: &PathSegment,
        ingress: IfId,
        egress: IfId,
        prev_mac: &[u8; MAC_LEN],
    ) -> Result<HopField, SegmentError> {
        let exp_time = self.config.max_exp_time;
        Ok(HopField {
            exp_time,
            cons_ingress: ingress,
            cons_egress: egress,
            mac: hop_field_mac(
                &self.config.mac_key,
                segment.timestamp,
                segment.seg_id,
                exp_time,
                ingress,
                egress,
                prev_mac,
            )?,
        })
    }
}

impl SegmentExtender for HopFieldExtender {
    fn extend(
        &self,
        segment: &mut PathSegment,
        ingress: IfId,
        egress: IfId,
        peers: &[IfId],
    ) -> Result<(), ExtendError> {
        let egress_info = self
            .intfs
            .get(egress)
            .ok_or(ExtendError::UnknownInterface(egress))?
            .topo_info();
        let prev_mac = segment.last_mac().unwrap_or([0; MAC_LEN]);
        let hop_field = self.hop_field(segment, ingress, egress, &prev_mac)?;

        let mut peer_entries = Vec::with_capacity(peers.len());
        for &peer in peers {
            // Peers removed by a concurrent topology reload are left out
            let Some(intf) = self.intfs.get(peer) else {
                continue;
            };
            let info = intf.topo_info();
            peer_entries.push(PeerEntry {
                peer_ia: info.remote_ia,
                peer_ifid: info.remote_ifid.unwrap_or(IfId(0)),
                peer_mtu: info.mtu,
                hop_field: self.hop_field(segment, peer, egress, &prev_mac)?,
            });
        }

        segment.as_entries.push(AsEntry {
            local: self.config.local_ia,
            next: egress_info.remote_ia,
            mtu: egress_info.mtu,
            hop_field,
            peers: peer_entries,
            signature: Vec::new(),
        });

        if let Some(key) = &self.config.signing_key {
            let raw = segment.pack()?;
            let signature = key.sign(&raw).to_bytes().to_vec();
            if let Some(entry) = segment.as_entries.last_mut() {
                entry.signature = signature;
            }
        }
        Ok(())
    }
}
