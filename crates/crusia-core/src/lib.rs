//! # Crusia Core
//!
//! Pure primitives for the Crusia save service: account records, the
//! version-keyed secret registry, and the decryption gateway that turns a
//! client-sealed save payload back into plaintext.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`SecretRegistry`] - Immutable table of protocol version to key material
//! - [`DecryptionGateway`] - Selects a key by declared version and opens a payload
//! - [`SealedPayload`] - `nonce ‖ ciphertext ‖ tag` framing of a save upload
//! - [`User`], [`SaveData`] - Records owned by the store
//!
//! ## Key Rotation
//!
//! Every client release declares the protocol version it seals with. Adding a
//! secret for a new version keeps old clients working; retiring a version's
//! secret locks those clients out with [`GatewayError::UnknownVersion`].

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod secret;
pub mod types;

pub use crypto::{SaveKey, SaveNonce, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use envelope::SealedPayload;
pub use error::{ConfigError, GatewayError};
pub use gateway::DecryptionGateway;
pub use secret::{Secret, SecretRegistry};
pub use types::{now_millis, NewUser, SaveData, User, UserId, EMPTY_SAVE};
