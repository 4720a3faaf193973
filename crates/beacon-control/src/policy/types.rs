//! Beacon policy and its YAML representation.
//!
//! ```yaml
//! Type: Propagation
//! BestSetSize: 5
//! CandidateSetSize: 100
//! Filter:
//!   MaxHopsLength: 8
//!   AsBlackList: ["ff00:0:133"]
//!   IsdBlackList: [3]
//! ```

use std::fmt;
use std::path::Path;

use serde::de::IntoDeserializer;
use serde::de::value::StrDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use super::filter::Filter;
use crate::error::PolicyError;

/// Default number of beacons selected per run.
pub const DEFAULT_BEST_SET_SIZE: usize = 5;

/// Default number of beacons retained as candidates.
pub const DEFAULT_CANDIDATE_SET_SIZE: usize = 100;

/// What a policy is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    Propagation,
    UpSegmentRegistration,
    DownSegmentRegistration,
    CoreSegmentRegistration,
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyType::Propagation => "Propagation",
            PolicyType::UpSegmentRegistration => "UpSegmentRegistration",
            PolicyType::DownSegmentRegistration => "DownSegmentRegistration",
            PolicyType::CoreSegmentRegistration => "CoreSegmentRegistration",
        };
        f.write_str(s)
    }
}

/// Selection bounds plus admission filter for one use of beacons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Number of beacons selected per run. Zero means unset.
    #[serde(rename = "BestSetSize", default)]
    pub best_set_size: usize,
    /// Number of beacons retained. Zero means unset.
    #[serde(rename = "CandidateSetSize", default)]
    pub candidate_set_size: usize,
    #[serde(rename = "Filter", default)]
    pub filter: Filter,
    /// Unset or empty in a file means "whatever the caller expects".
    #[serde(
        rename = "Type",
        default,
        deserialize_with = "empty_type_as_unset",
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_type: Option<PolicyType>,
}

fn empty_type_as_unset<'de, D>(deserializer: D) -> Result<Option<PolicyType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => {
            let de: StrDeserializer<'_, D::Error> = name.into_deserializer();
            PolicyType::deserialize(de).map(Some)
        }
    }
}

impl Policy {
    /// Policy with every field defaulted.
    pub fn new(policy_type: PolicyType) -> Self {
        let mut policy = Self {
            policy_type: Some(policy_type),
            ..Self::default()
        };
        policy.init_defaults();
        policy
    }

    /// Fill unset fields with defaults, including the filter's.
    pub fn init_defaults(&mut self) {
        if self.best_set_size == 0 {
            self.best_set_size = DEFAULT_BEST_SET_SIZE;
        }
        if self.candidate_set_size == 0 {
            self.candidate_set_size = DEFAULT_CANDIDATE_SET_SIZE;
        }
        self.filter.init_defaults();
    }

    /// Parse a policy of type `expected` from YAML and fill defaults.
    ///
    /// A missing or empty `Type` is taken to be `expected`; any other type is an
    /// error. The best set may not be larger than the candidate set.
    pub fn parse_yaml(raw: &[u8], expected: PolicyType) -> Result<Self, PolicyError> {
        let mut policy: Policy = serde_yaml::from_slice(raw)?;
        match policy.policy_type {
            None => policy.policy_type = Some(expected),
            Some(actual) if actual != expected => {
                return Err(PolicyError::TypeMismatch { expected, actual });
            }
            Some(_) => {}
        }
        policy.init_defaults();
        if policy.best_set_size > policy.candidate_set_size {
            return Err(PolicyError::InvalidBounds {
                best: policy.best_set_size,
                candidate: policy.candidate_set_size,
            });
        }
        Ok(policy)
    }

    /// Read and parse a policy file.
    pub fn load_from_yaml(
        path: impl AsRef<Path>,
        expected: PolicyType,
    ) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_yaml(&raw, expected)
    }

    /// The policy type. Always set on policies built by this module.
    pub fn policy_type(&self) -> Option<PolicyType> {
        self.policy_type
    }
}
