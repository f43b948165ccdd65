//! Error types for the token module.

use thiserror::Error;

/// Errors that can occur during token operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is malformed, unknown, tampered with or expired.
    ///
    /// Deliberately carries no reason.
    #[error("invalid token")]
    Invalid,

    /// A token could not be issued.
    #[error("token creation failed: {0}")]
    Creation(String),
}

/// Result type for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;
