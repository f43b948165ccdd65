//! Self-contained signed tokens.
//!
//! Wire form: `b64url(claims) "." b64url(signature)` where `claims` is the
//! CBOR encoding of [`Claims`] and the signature covers
//! `SIGN_DOMAIN || claims`.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crusia_core::UserId;

use crate::crypto::{TokenKeypair, SIGNATURE_LEN};
use crate::error::{Result, TokenError};
use crate::token::{now_secs, ttl_secs, TokenManager};

/// Domain separator prepended to the claims before signing.
const SIGN_DOMAIN: &[u8] = b"crusia-token-v1:";

/// Upper bound on an accepted token, to avoid decoding junk.
const MAX_TOKEN_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    uid: i64,
    iat: i64,
    exp: i64,
    jti: [u8; 16],
}

fn signing_message(claims: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(SIGN_DOMAIN.len() + claims.len());
    msg.extend_from_slice(SIGN_DOMAIN);
    msg.extend_from_slice(claims);
    msg
}

/// Tokens whose validity is checked by signature alone.
#[derive(Debug, Clone)]
pub struct SignedTokens {
    keypair: TokenKeypair,
    ttl: Duration,
}

impl SignedTokens {
    /// Create a manager signing with the given key.
    pub fn new(keypair: TokenKeypair, ttl: Duration) -> Self {
        Self { keypair, ttl }
    }

    /// Create a manager with a fresh key. Tokens do not survive a restart.
    pub fn generate(ttl: Duration) -> Self {
        Self::new(TokenKeypair::generate(), ttl)
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    pub fn create_at(&self, user: UserId, now: i64) -> Result<String> {
        let mut jti = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut jti);

        let claims = Claims {
            uid: user.get(),
            iat: now,
            exp: now.saturating_add(ttl_secs(self.ttl)),
            jti,
        };

        let mut encoded = Vec::new();
        ciborium::into_writer(&claims, &mut encoded)
            .map_err(|e| TokenError::Creation(format!("claims encoding: {}", e)))?;

        let signature = self.keypair.sign(&signing_message(&encoded));

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&encoded),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Resolve a token as if the current time were `now` (Unix seconds).
    pub fn resolve_at(&self, token: &str, now: i64) -> Result<UserId> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Invalid);
        }

        let (claims_b64, sig_b64) = token.split_once('.').ok_or(TokenError::Invalid)?;

        let encoded = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| TokenError::Invalid)?;
        let signature: [u8; SIGNATURE_LEN] = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Invalid)?
            .try_into()
            .map_err(|_| TokenError::Invalid)?;

        if !self.keypair.verify(&signing_message(&encoded), &signature) {
            debug!("token signature rejected");
            return Err(TokenError::Invalid);
        }

        let claims: Claims =
            ciborium::from_reader(encoded.as_slice()).map_err(|_| TokenError::Invalid)?;

        if now >= claims.exp {
            debug!(uid = claims.uid, exp = claims.exp, "token expired");
            return Err(TokenError::Invalid);
        }

        Ok(UserId::new(claims.uid))
    }
}

impl TokenManager for SignedTokens {
    fn create(&self, user: UserId) -> Result<String> {
        self.create_at(user, now_secs())
    }

    fn resolve(&self, token: &str) -> Result<UserId> {
        self.resolve_at(token, now_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn tokens() -> SignedTokens {
        SignedTokens::new(TokenKeypair::from_seed(&[7; 32]), HOUR)
    }

    #[test]
    fn test_create_resolve() {
        let tokens = tokens();
        let token = tokens.create_at(UserId::new(42), 1_000).unwrap();
        assert_eq!(tokens.resolve_at(&token, 1_001).unwrap(), UserId::new(42));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens = tokens();
        let a = tokens.create_at(UserId::new(1), 1_000).unwrap();
        let b = tokens.create_at(UserId::new(1), 1_000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = tokens();
        let token = tokens.create_at(UserId::new(1), 1_000).unwrap();

        assert!(tokens.resolve_at(&token, 1_000 + 3599).is_ok());
        assert_eq!(
            tokens.resolve_at(&token, 1_000 + 3600),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_other_key_rejects() {
        let token = tokens().create_at(UserId::new(1), 1_000).unwrap();
        let other = SignedTokens::new(TokenKeypair::from_seed(&[8; 32]), HOUR);
        assert_eq!(other.resolve_at(&token, 1_000), Err(TokenError::Invalid));
    }

    #[test]
    fn test_swapped_claims_rejected() {
        let tokens = tokens();
        let a = tokens.create_at(UserId::new(1), 1_000).unwrap();
        let b = tokens.create_at(UserId::new(2), 1_000).unwrap();

        let (claims_b, _) = b.split_once('.').unwrap();
        let (_, sig_a) = a.split_once('.').unwrap();
        let forged = format!("{}.{}", claims_b, sig_a);

        assert_eq!(tokens.resolve_at(&forged, 1_000), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_rejected() {
        let tokens = tokens();
        for token in ["", ".", "abc", "abc.def", "a.b.c", "!!!.???"] {
            assert_eq!(tokens.resolve_at(token, 0), Err(TokenError::Invalid));
        }
        let long = "a".repeat(MAX_TOKEN_LEN + 1);
        assert_eq!(tokens.resolve_at(&long, 0), Err(TokenError::Invalid));
    }

    proptest! {
        #[test]
        fn prop_any_user_roundtrips(uid in any::<i64>(), now in 0i64..4_000_000_000) {
            let tokens = tokens();
            let token = tokens.create_at(UserId::new(uid), now).unwrap();
            prop_assert_eq!(tokens.resolve_at(&token, now).unwrap(), UserId::new(uid));
        }

        #[test]
        fn prop_garbage_never_resolves(token in "[A-Za-z0-9_.-]{0,200}") {
            prop_assert_eq!(tokens().resolve_at(&token, 0), Err(TokenError::Invalid));
        }
    }
}
