//! Sealed save payload framing.
//!
//! A client seals its save with the key of the protocol version it declares
//! and uploads `nonce ‖ ciphertext ‖ tag`. On the wire that byte string is
//! base64 encoded (standard alphabet, padded).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::{SaveKey, SaveNonce, NONCE_LEN, TAG_LEN};
use crate::error::GatewayError;

/// A sealed save payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// Nonce used for encryption (unique per seal).
    pub nonce: SaveNonce,

    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Smallest valid frame: a nonce and an empty message's tag.
    pub const MIN_LEN: usize = NONCE_LEN + TAG_LEN;

    /// Seal plaintext with the given key under a fresh nonce.
    pub fn seal(plaintext: &[u8], key: &SaveKey) -> Result<Self, GatewayError> {
        let nonce = SaveNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;
        Ok(Self { nonce, ciphertext })
    }

    /// Open with the given key.
    pub fn open(&self, key: &SaveKey) -> Result<Vec<u8>, GatewayError> {
        key.decrypt(&self.ciphertext, &self.nonce)
    }

    /// Serialize to `nonce ‖ ciphertext ‖ tag`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        buf.extend_from_slice(self.nonce.as_bytes());
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Parse `nonce ‖ ciphertext ‖ tag`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GatewayError> {
        if bytes.len() < Self::MIN_LEN {
            return Err(GatewayError::DecryptionFailed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| GatewayError::DecryptionFailed)?;

        Ok(Self {
            nonce: SaveNonce::from_bytes(nonce),
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encode for the wire.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode wire text. Leading and trailing whitespace is ignored.
    pub fn from_base64(text: &[u8]) -> Result<Self, GatewayError> {
        Self::from_bytes(&Self::decode_wire(text)?)
    }

    /// Strip the base64 wire encoding without parsing the frame.
    pub fn decode_wire(text: &[u8]) -> Result<Vec<u8>, GatewayError> {
        STANDARD
            .decode(text.trim_ascii())
            .map_err(|_| GatewayError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = SaveKey::generate();
        let sealed = SealedPayload::seal(b"{\"x\":1}", &key).unwrap();
        assert_eq!(sealed.open(&key).unwrap(), b"{\"x\":1}");
    }

    #[test]
    fn test_wire_text_tolerates_whitespace() {
        let key = SaveKey::generate();
        let sealed = SealedPayload::seal(b"{}", &key).unwrap();
        let text = format!("  {}\n", sealed.to_base64());

        let parsed = SealedPayload::from_base64(text.as_bytes()).unwrap();
        assert_eq!(parsed, sealed);
    }

    #[test]
    fn test_short_frame_rejected() {
        let short = [0u8; SealedPayload::MIN_LEN - 1];
        assert_eq!(
            SealedPayload::from_bytes(&short),
            Err(GatewayError::DecryptionFailed)
        );
    }

    #[test]
    fn test_bad_base64_rejected() {
        assert_eq!(
            SealedPayload::from_base64(b"not base64 at all!"),
            Err(GatewayError::DecryptionFailed)
        );
    }

    #[test]
    fn test_empty_plaintext_has_minimum_length() {
        let key = SaveKey::generate();
        let sealed = SealedPayload::seal(b"", &key).unwrap();
        assert_eq!(sealed.to_bytes().len(), SealedPayload::MIN_LEN);
    }
}
