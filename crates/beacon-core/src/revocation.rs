//! Interface revocation records.

use crate::addr::IA;
use crate::topology::{IfId, LinkType};

/// Claim that an interface of `ia` is down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevInfo {
    pub ifid: IfId,
    pub ia: IA,
    pub link_type: LinkType,
    /// Issue time (seconds since the Unix epoch).
    pub timestamp: u32,
    /// Validity period in seconds.
    pub ttl_secs: u32,
}

impl RevInfo {
    /// Whether the revocation is still valid at `now` (seconds since the Unix epoch).
    pub fn is_active_at(&self, now: u32) -> bool {
        now >= self.timestamp && now - self.timestamp < self.ttl_secs
    }
}

/// A revocation together with the issuer's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRevInfo {
    pub info: RevInfo,
    pub signature: Vec<u8>,
}
