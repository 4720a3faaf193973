//! Propagator and extender configuration.

use std::fmt;

use ed25519_dalek::SigningKey;

use beacon_core::IA;

use crate::error::ConfigError;

/// Default maximum size of an outbound beacon frame.
pub const DEFAULT_MTU: u16 = 1472;

/// Smallest MTU a beacon server may be configured with.
pub const MIN_MTU: u16 = 1280;

/// Default hop field expiration time, in units of the segment lifetime.
pub const DEFAULT_MAX_EXP_TIME: u8 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagatorConfig {
    /// The AS this beacon server runs in.
    pub local_ia: IA,
    /// Whether the local AS is a core AS. Core ASes propagate on core links,
    /// all others on child links.
    pub core: bool,
    /// Maximum packed frame size. Zero means unset.
    pub mtu: u16,
}

impl PropagatorConfig {
    pub fn new(local_ia: IA, core: bool) -> Self {
        Self {
            local_ia,
            core,
            mtu: DEFAULT_MTU,
        }
    }

    pub fn init_defaults(&mut self) {
        if self.mtu == 0 {
            self.mtu = DEFAULT_MTU;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_ia.is_wildcard() {
            return Err(ConfigError::WildcardIa(self.local_ia));
        }
        if self.mtu < MIN_MTU {
            return Err(ConfigError::MtuTooSmall {
                mtu: self.mtu,
                min: MIN_MTU,
            });
        }
        Ok(())
    }
}

/// Key material and limits for [`HopFieldExtender`](super::HopFieldExtender).
#[derive(Clone)]
pub struct ExtenderConfig {
    pub local_ia: IA,
    /// Zero means unset.
    pub max_exp_time: u8,
    /// Key for hop field MACs.
    pub mac_key: Vec<u8>,
    /// Signs every appended AS entry when set.
    pub signing_key: Option<SigningKey>,
}

impl ExtenderConfig {
    pub fn new(local_ia: IA, mac_key: Vec<u8>) -> Self {
        Self {
            local_ia,
            max_exp_time: DEFAULT_MAX_EXP_TIME,
            mac_key,
            signing_key: None,
        }
    }

    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    pub fn init_defaults(&mut self) {
        if self.max_exp_time == 0 {
            self.max_exp_time = DEFAULT_MAX_EXP_TIME;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_ia.is_wildcard() {
            return Err(ConfigError::WildcardIa(self.local_ia));
        }
        if self.mac_key.is_empty() {
            return Err(ConfigError::EmptyMacKey);
        }
        Ok(())
    }
}

impl fmt::Debug for ExtenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtenderConfig")
            .field("local_ia", &self.local_ia)
            .field("max_exp_time", &self.max_exp_time)
            .field("mac_key", &"<redacted>")
            .field("signing", &self.signing_key.is_some())
            .finish()
    }
}
