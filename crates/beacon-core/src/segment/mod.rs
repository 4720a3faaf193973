//! Path segments: the ordered AS entries a beacon accumulates as it is
//! flooded from AS to AS.
//!
//! The packed form produced by [`PathSegment::pack`] is canonical, so it doubles
//! as an immutable template from which independent copies are decoded.

pub mod codec;
pub mod types;

pub use types::{AsEntry, HopField, MAC_LEN, PathSegment, PeerEntry};
