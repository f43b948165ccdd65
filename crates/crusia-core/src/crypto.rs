//! Symmetric cipher used for save payloads.
//!
//! ChaCha20-Poly1305 with a 256-bit key and a 96-bit nonce.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GatewayError;

/// Required key length in bytes.
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Poly1305 authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit save encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct SaveKey([u8; KEY_LEN]);

impl SaveKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, returning `None` if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &SaveNonce) -> Result<Vec<u8>, GatewayError> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|_| GatewayError::EncryptionFailed)?;

        cipher
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|_| GatewayError::EncryptionFailed)
    }

    /// Decrypt data with this key, verifying the authentication tag.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &SaveNonce) -> Result<Vec<u8>, GatewayError> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|_| GatewayError::DecryptionFailed)?;

        cipher
            .decrypt(Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| GatewayError::DecryptionFailed)
    }
}

impl fmt::Debug for SaveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SaveKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveNonce(pub [u8; NONCE_LEN]);

impl SaveNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SaveKey::generate();
        let nonce = SaveNonce::generate();
        let plaintext = b"{\"level\":3}";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SaveKey::generate();
        let key2 = SaveKey::generate();
        let nonce = SaveNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        assert_eq!(
            key2.decrypt(&ciphertext, &nonce),
            Err(GatewayError::DecryptionFailed)
        );
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert!(SaveKey::from_slice(&[0u8; 16]).is_none());
        assert!(SaveKey::from_slice(&[0u8; 33]).is_none());
        assert!(SaveKey::from_slice(&[7u8; KEY_LEN]).is_some());
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let key = SaveKey::from_bytes([0xab; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SaveKey(..)");
    }
}
