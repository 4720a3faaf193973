//! Beacons: path segments in flight between neighboring ASes.

use std::fmt;

use crate::segment::PathSegment;
use crate::topology::IfId;

/// A path segment together with the local interface it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub segment: PathSegment,
    /// Local interface the beacon was received on.
    pub in_ifid: IfId,
}

impl Beacon {
    pub fn new(segment: PathSegment, in_ifid: IfId) -> Self {
        Self { segment, in_ifid }
    }

    /// Number of AS entries on the segment.
    pub fn hops(&self) -> usize {
        self.segment.len()
    }
}

impl fmt::Display for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, ia) in self.segment.ias().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{ia}")?;
        }
        write!(f, "] in_ifid={} seg_id={:#06x}", self.in_ifid, self.segment.seg_id)
    }
}
