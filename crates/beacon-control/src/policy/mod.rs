//! Beacon admission policies.
//!
//! A [`Policy`] bounds how many beacons are considered and selected, and its
//! [`Filter`] decides which beacons are eligible at all.

pub mod filter;
pub mod types;

pub use filter::{DEFAULT_MAX_HOPS_LENGTH, Filter};
pub use types::{DEFAULT_BEST_SET_SIZE, DEFAULT_CANDIDATE_SET_SIZE, Policy, PolicyType};
