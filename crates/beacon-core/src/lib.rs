//! Core types for path-aware inter-domain beaconing.
//!
//! This crate defines ISD-AS addressing, the path segment model carried by
//! beacons, interface topology records, revocations, and the binary codec for
//! segments and one-hop control frames. It performs no I/O.

pub mod addr;
pub mod beacon;
pub mod error;
pub mod frame;
pub mod revocation;
pub mod segment;
pub mod topology;

mod wire;

pub use addr::{Asn, IA, Isd};
pub use beacon::Beacon;
pub use error::{AddrError, FrameError, SegmentError};
pub use frame::Frame;
pub use revocation::{RevInfo, SignedRevInfo};
pub use segment::{AsEntry, HopField, MAC_LEN, PathSegment, PeerEntry};
pub use topology::{IfId, IfInfo, IfInfoMap, LinkType};
