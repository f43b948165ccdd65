//! Version-keyed secret registry.
//!
//! Built once at startup from the configured secrets and never mutated
//! afterwards, so concurrent readers need no locking.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::crypto::{SaveKey, KEY_LEN};
use crate::error::{ConfigError, GatewayError};

/// Raw key material for one protocol version.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    pub version: u32,
    pub key_material: Vec<u8>,
}

impl Secret {
    /// Create from raw bytes.
    pub fn new(version: u32, key_material: impl Into<Vec<u8>>) -> Self {
        Self {
            version,
            key_material: key_material.into(),
        }
    }

    /// Decode a secret given as base64 text, as it appears in configuration.
    pub fn from_base64(version: u32, key: &str) -> Result<Self, ConfigError> {
        let key_material =
            STANDARD
                .decode(key.trim())
                .map_err(|e| ConfigError::InvalidEncoding {
                    version,
                    reason: e.to_string(),
                })?;
        Ok(Self {
            version,
            key_material,
        })
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("version", &self.version)
            .field("key_material", &format_args!("<{} bytes>", self.key_material.len()))
            .finish()
    }
}

/// Immutable mapping from protocol version to save key.
#[derive(Debug, Clone)]
pub struct SecretRegistry {
    keys: BTreeMap<u32, SaveKey>,
}

impl SecretRegistry {
    /// Build the registry.
    ///
    /// Fails if a version appears twice or if any key does not have the
    /// length the save cipher requires.
    pub fn load(secrets: impl IntoIterator<Item = Secret>) -> Result<Self, ConfigError> {
        let mut keys = BTreeMap::new();

        for secret in secrets {
            let key = SaveKey::from_slice(&secret.key_material).ok_or(
                ConfigError::InvalidKeyLength {
                    version: secret.version,
                    expected: KEY_LEN,
                    actual: secret.key_material.len(),
                },
            )?;

            if keys.insert(secret.version, key).is_some() {
                return Err(ConfigError::DuplicateVersion(secret.version));
            }
        }

        debug!(versions = ?keys.keys().collect::<Vec<_>>(), "secret registry loaded");
        Ok(Self { keys })
    }

    /// Look up the key for a protocol version.
    pub fn lookup(&self, version: u32) -> Result<&SaveKey, GatewayError> {
        self.keys
            .get(&version)
            .ok_or(GatewayError::UnknownVersion(version))
    }

    /// Check whether a version has a secret.
    pub fn contains(&self, version: u32) -> bool {
        self.keys.contains_key(&version)
    }

    /// All registered versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.keys.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
