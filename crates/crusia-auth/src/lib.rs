//! # Crusia Auth
//!
//! Opaque session tokens for the Crusia save service.
//!
//! ## Overview
//!
//! A [`TokenManager`] issues a token bound to one user id and resolves it
//! back. Two backends satisfy the same contract:
//!
//! - [`SignedTokens`]: self-contained tokens carrying CBOR claims
//!   (`uid`, `iat`, `exp`, `jti`) signed with a server-held Ed25519 key. No
//!   lookup table; tokens stay valid across instances sharing the key.
//! - [`SessionTable`]: 256-bit random tokens mapped to user ids in memory,
//!   keyed by the Blake3 hash of the token, with explicit expiry bookkeeping.
//!
//! ## Failure Model
//!
//! Malformed, unknown, tampered and expired tokens all resolve to the same
//! [`TokenError::Invalid`]. Callers cannot tell which check failed.
//!
//! Tokens are never revoked early; they lapse at expiry.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use crusia_auth::{SignedTokens, TokenManager};
//! use crusia_core::UserId;
//!
//! let tokens = SignedTokens::generate(Duration::from_secs(3600));
//! let token = tokens.create(UserId::new(7)).unwrap();
//! assert_eq!(tokens.resolve(&token).unwrap(), UserId::new(7));
//! ```

pub mod crypto;
pub mod error;
pub mod session;
pub mod signed;
pub mod token;

pub use crypto::TokenKeypair;
pub use error::{Result, TokenError};
pub use session::SessionTable;
pub use signed::SignedTokens;
pub use token::{now_secs, TokenManager, DEFAULT_TTL};
