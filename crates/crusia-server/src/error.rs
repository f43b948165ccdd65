//! Error types for server startup.

use std::path::PathBuf;

use crusia_core::ConfigError;
use crusia_store::StoreError;
use thiserror::Error;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Secrets or settings are invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The config file could not be parsed.
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The config file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be opened.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
