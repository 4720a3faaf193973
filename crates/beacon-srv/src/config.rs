//! TOML configuration for the beacon server.
//!
//! ```toml
//! [general]
//! ia = "1-ff00:0:110"
//! core = true
//! listen = "127.0.0.1:30041"
//! topology = "/etc/beacon-srv/topology.toml"
//! policy = "/etc/beacon-srv/propagation.yml"
//!
//! [beaconing]
//! mac_key = "00112233445566778899aabbccddeeff"
//!
//! [logging]
//! level = "info"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ed25519_dalek::SigningKey;
use serde::Deserialize;

use beacon_control::propagation::{DEFAULT_MAX_EXP_TIME, DEFAULT_MTU, ExtenderConfig};
use beacon_control::{IfStateConfig, Policy, PolicyType, PropagatorConfig};
use beacon_core::IA;

use crate::error::ServerError;

/// Top-level server configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub general: GeneralSection,
    pub beaconing: BeaconingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("failed to read config file: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ServerError> {
        toml::from_str(s).map_err(|e| ServerError::Config(format!("failed to parse config: {e}")))
    }

    pub fn ifstate_config(&self) -> IfStateConfig {
        let mut cfg = IfStateConfig {
            keepalive_interval: Duration::from_millis(self.beaconing.keepalive_interval_ms),
            keepalive_timeout: Duration::from_millis(self.beaconing.keepalive_timeout_ms),
        };
        cfg.init_defaults();
        cfg
    }

    pub fn propagator_config(&self) -> PropagatorConfig {
        PropagatorConfig {
            local_ia: self.general.ia,
            core: self.general.core,
            mtu: self.beaconing.mtu,
        }
    }

    /// Decode the key material of the `[beaconing]` section.
    pub fn extender_config(&self) -> Result<ExtenderConfig, ServerError> {
        let mac_key = hex::decode(&self.beaconing.mac_key)
            .map_err(|e| ServerError::InvalidKey(format!("mac_key: {e}")))?;
        let mut cfg = ExtenderConfig::new(self.general.ia, mac_key);
        cfg.max_exp_time = self.beaconing.max_exp_time;
        if let Some(seed) = &self.beaconing.signing_key {
            cfg = cfg.with_signing_key(decode_signing_key(seed)?);
        }
        Ok(cfg)
    }

    /// The propagation policy, defaulted when no policy file is configured.
    pub fn load_policy(&self) -> Result<Policy, ServerError> {
        match &self.general.policy {
            Some(path) => Ok(Policy::load_from_yaml(path, PolicyType::Propagation)?),
            None => Ok(Policy::new(PolicyType::Propagation)),
        }
    }
}

fn decode_signing_key(seed: &str) -> Result<SigningKey, ServerError> {
    let bytes = hex::decode(seed).map_err(|e| ServerError::InvalidKey(format!("signing_key: {e}")))?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ServerError::InvalidKey(format!(
            "signing_key: expected 32 bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

/// The `[general]` section.
#[derive(Debug, Deserialize)]
pub struct GeneralSection {
    pub ia: IA,
    #[serde(default)]
    pub core: bool,
    /// UDP address for control frames from neighbors.
    pub listen: SocketAddr,
    pub topology: PathBuf,
    /// Propagation policy (YAML). Defaults apply when unset.
    pub policy: Option<PathBuf>,
}

/// The `[beaconing]` section.
#[derive(Debug, Deserialize)]
pub struct BeaconingSection {
    #[serde(default = "default_propagation_interval_ms")]
    pub propagation_interval_ms: u64,
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    /// 0 means a multiple of the keepalive interval.
    #[serde(default)]
    pub keepalive_timeout_ms: u64,
    #[serde(default = "default_expiry_sweep_interval_ms")]
    pub expiry_sweep_interval_ms: u64,
    #[serde(default = "default_mtu")]
    pub mtu: u16,
    #[serde(default = "default_max_exp_time")]
    pub max_exp_time: u8,
    /// Hex-encoded hop field MAC key.
    pub mac_key: String,
    /// Hex-encoded 32-byte Ed25519 seed. AS entries are unsigned when unset.
    pub signing_key: Option<String>,
}

fn default_propagation_interval_ms() -> u64 {
    5000
}

fn default_keepalive_interval_ms() -> u64 {
    1000
}

fn default_expiry_sweep_interval_ms() -> u64 {
    500
}

fn default_mtu() -> u16 {
    DEFAULT_MTU
}

fn default_max_exp_time() -> u8 {
    DEFAULT_MAX_EXP_TIME
}

impl BeaconingSection {
    pub fn propagation_interval(&self) -> Duration {
        Duration::from_millis(self.propagation_interval_ms)
    }

    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_sweep_interval_ms)
    }
}

/// The `[logging]` section.
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
