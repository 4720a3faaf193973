//! Interface liveness constants.

use std::time::Duration;

/// Default time between keepalives sent to each neighbor.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Keepalive timeout as a multiple of the keepalive interval.
pub const KEEPALIVE_TIMEOUT_FACTOR: u32 = 3;

/// Default time without keepalives after which an interface expires.
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_KEEPALIVE_INTERVAL.as_secs() * KEEPALIVE_TIMEOUT_FACTOR as u64);
