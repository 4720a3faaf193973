//! Error types for the beacon-core crate.

use crate::topology::IfId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("invalid AS number: {0:?}")]
    InvalidAsn(String),

    #[error("AS number out of range: {0}")]
    AsnOutOfRange(u64),

    #[error("invalid ISD number: {0:?}")]
    InvalidIsd(String),

    #[error("invalid ISD-AS: {0:?}")]
    InvalidIa(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("segment too short: need at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("segment has no AS entries")]
    Empty,

    #[error("{0} trailing bytes after segment")]
    TrailingBytes(usize),

    #[error("too many {what}: {count} (max 255)")]
    TooMany { what: &'static str, count: usize },

    #[error("signature too long: {0} bytes")]
    SignatureTooLong(usize),

    #[error("interface id {0} does not fit the wire format")]
    IfIdOutOfRange(IfId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown frame type: {0:#04x}")]
    UnknownType(u8),

    #[error("frame too short: need at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("invalid link type: {0}")]
    InvalidLinkType(u8),

    #[error("segment error: {0}")]
    Segment(#[from] SegmentError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_error_display() {
        let err = SegmentError::TooShort { min: 7, actual: 3 };
        assert_eq!(
            err.to_string(),
            "segment too short: need at least 7 bytes, got 3"
        );
        assert_eq!(SegmentError::Empty.to_string(), "segment has no AS entries");
        assert_eq!(
            SegmentError::IfIdOutOfRange(IfId(70000)).to_string(),
            "interface id 70000 does not fit the wire format"
        );
    }

    #[test]
    fn test_frame_error_from_segment_error() {
        let fe: FrameError = SegmentError::Empty.into();
        assert!(matches!(fe, FrameError::Segment(SegmentError::Empty)));
        assert_eq!(
            FrameError::UnknownType(0x7f).to_string(),
            "unknown frame type: 0x7f"
        );
    }

    #[test]
    fn test_addr_error_display() {
        let err = AddrError::InvalidIa("bogus".into());
        assert_eq!(err.to_string(), "invalid ISD-AS: \"bogus\"");
    }
}
