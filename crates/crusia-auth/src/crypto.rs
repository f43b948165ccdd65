//! Signing key for self-contained tokens.
//!
//! Wraps Ed25519 signing with a strong type. This key is independent of the
//! save secrets.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use std::fmt;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// A keypair for signing tokens.
#[derive(Clone)]
pub struct TokenKeypair {
    signing_key: SigningKey,
}

impl TokenKeypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Create from a seed slice, returning `None` if it is not 32 bytes.
    pub fn from_seed_slice(seed: &[u8]) -> Option<Self> {
        let seed: [u8; 32] = seed.try_into().ok()?;
        Some(Self::from_seed(&seed))
    }

    /// Public half, hex encoded.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature made by this keypair.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_LEN]) -> bool {
        let signature = Signature::from_bytes(signature);
        self.signing_key
            .verifying_key()
            .verify(message, &signature)
            .is_ok()
    }
}

impl fmt::Debug for TokenKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenKeypair({})", &self.public_key_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let keypair = TokenKeypair::generate();
        let signature = keypair.sign(b"claims");

        assert!(keypair.verify(b"claims", &signature));
        assert!(!keypair.verify(b"claimz", &signature));
    }

    #[test]
    fn test_other_key_rejects() {
        let a = TokenKeypair::generate();
        let b = TokenKeypair::generate();
        assert!(!b.verify(b"claims", &a.sign(b"claims")));
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = TokenKeypair::from_seed(&[0x42; 32]);
        let kp2 = TokenKeypair::from_seed_slice(&[0x42; 32]).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert!(TokenKeypair::from_seed_slice(&[0u8; 31]).is_none());
    }
}
