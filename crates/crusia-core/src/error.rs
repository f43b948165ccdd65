//! Error types for the Crusia core.

use thiserror::Error;

/// Startup errors raised while building the secret registry.
///
/// These are fatal: a process with a bad secret table must not serve.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate secret for protocol version {0}")]
    DuplicateVersion(u32),

    #[error("secret for protocol version {version} has {actual} bytes, cipher requires {expected}")]
    InvalidKeyLength {
        version: u32,
        expected: usize,
        actual: usize,
    },

    #[error("secret for protocol version {version} is not valid base64: {reason}")]
    InvalidEncoding { version: u32, reason: String },

    #[error("advertised protocol version {0} has no secret")]
    CurrentVersionMissing(u32),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by the decryption gateway.
///
/// No variant carries cipher detail. `UnknownVersion` and
/// `DecryptionFailed` are client errors; `EncryptionFailed` only comes out of
/// sealing and is a server fault.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    /// The declared protocol version has no secret in the registry.
    #[error("unknown protocol version: {0}")]
    UnknownVersion(u32),

    /// Framing, length, encoding or authentication tag mismatch.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The cipher refused to seal the plaintext.
    #[error("encryption failed")]
    EncryptionFailed,
}
