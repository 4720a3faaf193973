//! Error types for interface state, policies and propagation.

use std::path::PathBuf;

use beacon_core::{FrameError, IA, IfId, SegmentError};

use crate::policy::PolicyType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IfStateError {
    #[error("interface {ifid} activated in the meantime")]
    ActivatedInMeantime { ifid: IfId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("max hops length exceeded: max {max}, actual {actual}")]
    MaxHopsExceeded { max: usize, actual: usize },

    #[error("contains blacklisted AS: {0}")]
    BlacklistedAs(IA),

    #[error("contains blacklisted ISD: {0}")]
    BlacklistedIsd(IA),
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("unable to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to parse policy: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("policy type does not match: expected {expected}, actual {actual}")]
    TypeMismatch {
        expected: PolicyType,
        actual: PolicyType,
    },

    #[error("invalid set sizes: best set {best} exceeds candidate set {candidate}")]
    InvalidBounds { best: usize, candidate: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("local IA must not be a wildcard: {0}")]
    WildcardIa(IA),

    #[error("MTU too small: {mtu} < {min}")]
    MtuTooSmall { mtu: u16, min: u16 },

    #[error("hop field MAC key must not be empty")]
    EmptyMacKey,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("beacon source unavailable: {0}")]
    Unavailable(String),

    #[error("unable to load beacon: {0}")]
    Beacon(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtendError {
    #[error("unknown interface: {0}")]
    UnknownInterface(IfId),

    #[error("segment error: {0}")]
    Segment(#[from] SegmentError),
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short write: sent {sent} of {len} bytes")]
    ShortWrite { sent: usize, len: usize },

    #[error("send rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("none propagated: expected {expected}")]
    NonePropagated { expected: usize },

    #[error("segment error: {0}")]
    Segment(#[from] SegmentError),

    #[error("unable to pack message: {0}")]
    Frame(#[from] FrameError),

    #[error("unable to extend beacon: {0}")]
    Extend(#[from] ExtendError),

    #[error("unable to send packet: {0}")]
    Send(#[from] SendError),

    #[error("message too large: {size} bytes exceeds MTU {mtu}")]
    MessageTooLarge { size: usize, mtu: u16 },

    #[error("propagation task failed: {0}")]
    TaskFailed(String),
}
