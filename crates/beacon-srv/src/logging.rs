//! Tracing subscriber configuration for the beacon server.
//!
//! Log levels follow these conventions:
//! - ERROR: Beacons that could not be propagated at all, failed passes
//! - WARN: Failed sends on one interface, revocation conflicts
//! - INFO: Propagated beacons, interface state transitions
//! - DEBUG: Ignored links, skipped loops, dropped frames
//! - TRACE: Wire-level detail

use tracing_subscriber::EnvFilter;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .init();
}

/// Initialize the tracing subscriber with JSON output.
///
/// Activated by setting `RUST_LOG_FORMAT=json`.
pub fn init_json(default_level: &str) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter(default_level))
        .init();
}

/// Initialize the tracing subscriber for tests.
///
/// Uses `try_init` to avoid panicking if called multiple times.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("debug"))
        .with_test_writer()
        .try_init();
}
