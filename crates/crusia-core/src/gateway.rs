//! Decryption gateway.
//!
//! Resolves the client-declared protocol version to a key and opens the
//! sealed payload. The plaintext is returned as-is; judging its structure is
//! left to the caller.

use std::sync::Arc;

use tracing::debug;

use crate::envelope::SealedPayload;
use crate::error::GatewayError;
use crate::secret::SecretRegistry;

/// Opens save payloads with the key selected by protocol version.
#[derive(Debug, Clone)]
pub struct DecryptionGateway {
    registry: Arc<SecretRegistry>,
}

impl DecryptionGateway {
    pub fn new(registry: Arc<SecretRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this gateway.
    pub fn registry(&self) -> &SecretRegistry {
        &self.registry
    }

    /// Decrypt `nonce ‖ ciphertext ‖ tag` bytes.
    ///
    /// The version is resolved before the payload is looked at, so an
    /// unregistered version fails with `UnknownVersion` for every input.
    pub fn decrypt(&self, version: u32, sealed: &[u8]) -> Result<Vec<u8>, GatewayError> {
        let key = self.registry.lookup(version)?;
        let payload = SealedPayload::from_bytes(sealed)?;
        payload.open(key).inspect_err(|_| {
            debug!(version, len = sealed.len(), "save payload failed authentication");
        })
    }

    /// Decrypt a payload in its wire form (base64 text).
    pub fn decrypt_wire(&self, version: u32, body: &[u8]) -> Result<Vec<u8>, GatewayError> {
        self.registry.lookup(version)?;
        let raw = SealedPayload::decode_wire(body).inspect_err(|_| {
            debug!(version, len = body.len(), "save payload is not base64");
        })?;
        self.decrypt(version, &raw)
    }

    /// Seal plaintext for a version, as a client of that version would.
    pub fn seal(&self, version: u32, plaintext: &[u8]) -> Result<SealedPayload, GatewayError> {
        let key = self.registry.lookup(version)?;
        SealedPayload::seal(plaintext, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use crate::secret::Secret;

    fn gateway() -> DecryptionGateway {
        let registry = SecretRegistry::load(vec![
            Secret::new(1, vec![0x11; KEY_LEN]),
            Secret::new(2, vec![0x22; KEY_LEN]),
        ])
        .unwrap();
        DecryptionGateway::new(Arc::new(registry))
    }

    #[test]
    fn test_decrypt_roundtrip() {
        let gateway = gateway();
        let sealed = gateway.seal(2, b"{\"x\":1}").unwrap();

        let plaintext = gateway.decrypt(2, &sealed.to_bytes()).unwrap();
        assert_eq!(plaintext, b"{\"x\":1}");
    }

    #[test]
    fn test_wire_roundtrip() {
        let gateway = gateway();
        let sealed = gateway.seal(1, b"{}").unwrap();

        let plaintext = gateway
            .decrypt_wire(1, sealed.to_base64().as_bytes())
            .unwrap();
        assert_eq!(plaintext, b"{}");
    }

    #[test]
    fn test_unknown_version_checked_first() {
        let gateway = gateway();
        assert_eq!(
            gateway.decrypt(9, b""),
            Err(GatewayError::UnknownVersion(9))
        );
        assert_eq!(
            gateway.decrypt_wire(9, b"garbage"),
            Err(GatewayError::UnknownVersion(9))
        );
    }

    #[test]
    fn test_wrong_version_key_fails() {
        let gateway = gateway();
        let sealed = gateway.seal(1, b"{\"x\":1}").unwrap();

        assert_eq!(
            gateway.decrypt(2, &sealed.to_bytes()),
            Err(GatewayError::DecryptionFailed)
        );
    }

    #[test]
    fn test_flipped_byte_fails() {
        let gateway = gateway();
        let mut bytes = gateway.seal(1, b"{\"x\":1}").unwrap().to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert_eq!(
            gateway.decrypt(1, &bytes),
            Err(GatewayError::DecryptionFailed)
        );
    }

    #[test]
    fn test_wire_tamper_matches_raw_path() {
        let gateway = gateway();
        let mut bytes = gateway.seal(2, b"{\"x\":1}").unwrap().to_bytes();
        bytes[0] ^= 0x80;
        let wire = SealedPayload::from_bytes(&bytes).unwrap().to_base64();

        assert_eq!(
            gateway.decrypt_wire(2, wire.as_bytes()),
            gateway.decrypt(2, &bytes)
        );
        assert_eq!(
            gateway.decrypt_wire(2, b"%%%"),
            Err(GatewayError::DecryptionFailed)
        );
    }
}
