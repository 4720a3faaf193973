//! Hop-count and blacklist filtering of beacons.

use serde::{Deserialize, Serialize};

use beacon_core::{Asn, Beacon, Isd};

use crate::error::FilterError;

/// Default maximum number of AS entries on a segment.
pub const DEFAULT_MAX_HOPS_LENGTH: usize = 10;

/// Stateless admission rule over a beacon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Maximum number of AS entries a segment may have. Zero means unset.
    #[serde(rename = "MaxHopsLength", default)]
    pub max_hops_length: usize,
    /// AS numbers that may not appear on a segment.
    #[serde(rename = "AsBlackList", default)]
    pub as_blacklist: Vec<Asn>,
    /// ISDs that may not appear on a segment.
    #[serde(rename = "IsdBlackList", default)]
    pub isd_blacklist: Vec<Isd>,
}

impl Filter {
    /// Fill unset fields with defaults.
    pub fn init_defaults(&mut self) {
        if self.max_hops_length == 0 {
            self.max_hops_length = DEFAULT_MAX_HOPS_LENGTH;
        }
    }

    /// Check the beacon against the filter, returning why it is rejected.
    pub fn apply(&self, beacon: &Beacon) -> Result<(), FilterError> {
        let hops = beacon.segment.len();
        if hops > self.max_hops_length {
            return Err(FilterError::MaxHopsExceeded {
                max: self.max_hops_length,
                actual: hops,
            });
        }
        for ia in beacon.segment.ias() {
            if self.as_blacklist.contains(&ia.asn) {
                return Err(FilterError::BlacklistedAs(ia));
            }
            if self.isd_blacklist.contains(&ia.isd) {
                return Err(FilterError::BlacklistedIsd(ia));
            }
        }
        Ok(())
    }
}
