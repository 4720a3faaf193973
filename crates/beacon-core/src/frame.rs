//! One-hop control frames exchanged between neighboring beacon servers.
//!
//! ```text
//! frame      = type:u8 body
//! 0x01 beacon     = src_ia:IA dst_ia:IA egress_ifid:u16 segment
//! 0x02 keepalive  = origin_ia:IA origin_ifid:u16
//! 0x03 revocation = ifid:u16 ia:IA link_type:u8 timestamp:u32 ttl:u32 sig_len:u16 sig
//! ```

use crate::addr::IA;
use crate::error::{FrameError, SegmentError};
use crate::revocation::{RevInfo, SignedRevInfo};
use crate::segment::PathSegment;
use crate::segment::codec::read_segment;
use crate::topology::{IfId, LinkType};
use crate::wire::{Reader, put_ifid};

pub const FRAME_TYPE_BEACON: u8 = 0x01;
pub const FRAME_TYPE_KEEPALIVE: u8 = 0x02;
pub const FRAME_TYPE_REVOCATION: u8 = 0x03;

/// A decoded control frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A beacon extended by `src_ia` and sent out of its interface `egress_ifid`.
    Beacon {
        src_ia: IA,
        dst_ia: IA,
        egress_ifid: IfId,
        segment: PathSegment,
    },
    /// Liveness signal for the link behind `origin_ifid` of `origin_ia`.
    Keepalive { origin_ia: IA, origin_ifid: IfId },
    Revocation(SignedRevInfo),
}

impl Frame {
    /// Frame type byte.
    pub fn frame_type(&self) -> u8 {
        match self {
            Frame::Beacon { .. } => FRAME_TYPE_BEACON,
            Frame::Keepalive { .. } => FRAME_TYPE_KEEPALIVE,
            Frame::Revocation(_) => FRAME_TYPE_REVOCATION,
        }
    }

    /// Encode the frame.
    pub fn pack(&self) -> Result<Vec<u8>, FrameError> {
        let mut out = vec![self.frame_type()];
        match self {
            Frame::Beacon {
                src_ia,
                dst_ia,
                egress_ifid,
                segment,
            } => {
                out.extend_from_slice(&src_ia.to_u64().to_be_bytes());
                out.extend_from_slice(&dst_ia.to_u64().to_be_bytes());
                put_ifid(&mut out, *egress_ifid)?;
                segment.pack_into(&mut out)?;
            }
            Frame::Keepalive {
                origin_ia,
                origin_ifid,
            } => {
                out.extend_from_slice(&origin_ia.to_u64().to_be_bytes());
                put_ifid(&mut out, *origin_ifid)?;
            }
            Frame::Revocation(rev) => {
                put_ifid(&mut out, rev.info.ifid)?;
                out.extend_from_slice(&rev.info.ia.to_u64().to_be_bytes());
                out.push(rev.info.link_type as u8);
                out.extend_from_slice(&rev.info.timestamp.to_be_bytes());
                out.extend_from_slice(&rev.info.ttl_secs.to_be_bytes());
                let sig_len = u16::try_from(rev.signature.len())
                    .map_err(|_| SegmentError::SignatureTooLong(rev.signature.len()))?;
                out.extend_from_slice(&sig_len.to_be_bytes());
                out.extend_from_slice(&rev.signature);
            }
        }
        Ok(out)
    }

    /// Decode a frame from raw datagram bytes.
    pub fn parse(raw: &[u8]) -> Result<Self, FrameError> {
        let (&frame_type, body) = raw.split_first().ok_or(FrameError::Empty)?;
        let mut r = Reader::new(body);
        let frame = match frame_type {
            FRAME_TYPE_BEACON => Frame::Beacon {
                src_ia: IA::from_u64(r.read_u64()?),
                dst_ia: IA::from_u64(r.read_u64()?),
                egress_ifid: r.read_ifid()?,
                segment: read_segment(&mut r)?,
            },
            FRAME_TYPE_KEEPALIVE => Frame::Keepalive {
                origin_ia: IA::from_u64(r.read_u64()?),
                origin_ifid: r.read_ifid()?,
            },
            FRAME_TYPE_REVOCATION => {
                let ifid = r.read_ifid()?;
                let ia = IA::from_u64(r.read_u64()?);
                let lt = r.read_u8()?;
                let link_type = LinkType::from_u8(lt).ok_or(FrameError::InvalidLinkType(lt))?;
                let timestamp = r.read_u32()?;
                let ttl_secs = r.read_u32()?;
                let sig_len = r.read_u16()?;
                let signature = r.take(usize::from(sig_len))?.to_vec();
                Frame::Revocation(SignedRevInfo {
                    info: RevInfo {
                        ifid,
                        ia,
                        link_type,
                        timestamp,
                        ttl_secs,
                    },
                    signature,
                })
            }
            other => return Err(FrameError::UnknownType(other)),
        };
        r.finish()?;
        Ok(frame)
    }
}
