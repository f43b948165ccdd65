//! Server configuration.
//!
//! Read from a YAML file:
//!
//! ```yaml
//! addr: "0.0.0.0:8080"
//! version: 2
//! secrets:
//!   - version: 1
//!     key: "<base64, 32 bytes>"
//!   - version: 2
//!     key: "<base64, 32 bytes>"
//! database: crusia.db        # optional, in-memory when absent
//! token:                     # optional
//!   backend: session         # or `signed`
//!   ttl_secs: 86400
//!   signing_key: "<base64, 32 bytes>"
//! ```
//!
//! Loading validates everything up front. The result is immutable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crusia_auth::{TokenKeypair, DEFAULT_TTL};
use crusia_core::{ConfigError, Secret, SecretRegistry};

use crate::error::{Result, ServerError};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// How often the session backend drops expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    addr: Option<String>,
    version: u32,
    secrets: Vec<FileSecret>,
    #[serde(default)]
    database: Option<PathBuf>,
    #[serde(default)]
    token: FileToken,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSecret {
    version: u32,
    key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileToken {
    #[serde(default)]
    backend: TokenBackend,
    #[serde(default)]
    ttl_secs: Option<u64>,
    #[serde(default)]
    signing_key: Option<String>,
    #[serde(default)]
    sweep_secs: Option<u64>,
}

/// Which token manager to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// Random tokens held in a server-side table.
    #[default]
    Session,
    /// Self-contained signed tokens. The user id is readable by the bearer.
    Signed,
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub backend: TokenBackend,
    pub ttl: Duration,
    /// Signing key for the signed backend. Generated per process when absent.
    pub signing_key: Option<TokenKeypair>,
    pub sweep_interval: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            backend: TokenBackend::Session,
            ttl: DEFAULT_TTL,
            signing_key: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub addr: String,
    /// Save version advertised to clients. Always present in `registry`.
    pub version: u32,
    pub registry: Arc<SecretRegistry>,
    /// SQLite file. `None` keeps everything in memory.
    pub database: Option<PathBuf>,
    pub token: TokenSettings,
}

impl ServerConfig {
    /// Build from already decoded secrets.
    pub fn new(version: u32, secrets: Vec<Secret>) -> Result<Self> {
        let registry = SecretRegistry::load(secrets)?;
        if !registry.contains(version) {
            return Err(ConfigError::CurrentVersionMissing(version).into());
        }

        Ok(Self {
            addr: DEFAULT_ADDR.to_string(),
            version,
            registry: Arc::new(registry),
            database: None,
            token: TokenSettings::default(),
        })
    }

    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(text)?;

        let secrets = file
            .secrets
            .iter()
            .map(|s| Secret::from_base64(s.version, &s.key))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut config = Self::new(file.version, secrets)?;
        if let Some(addr) = file.addr {
            config.addr = normalize_addr(&addr);
        }
        config.database = file.database;
        config.token = token_settings(file.token)?;
        Ok(config)
    }

    /// Replace the listen address.
    pub fn with_addr(mut self, addr: impl AsRef<str>) -> Self {
        self.addr = normalize_addr(addr.as_ref());
        self
    }
}

fn token_settings(file: FileToken) -> Result<TokenSettings> {
    let signing_key = match file.signing_key {
        Some(encoded) => {
            let seed = STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigError::Invalid(format!("token.signing_key: {}", e)))?;
            let keypair = TokenKeypair::from_seed_slice(&seed).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "token.signing_key must be 32 bytes, got {}",
                    seed.len()
                ))
            })?;
            Some(keypair)
        }
        None => None,
    };

    let ttl = match file.ttl_secs {
        Some(0) => return Err(ConfigError::Invalid("token.ttl_secs must be positive".into()).into()),
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_TTL,
    };

    let sweep_interval = match file.sweep_secs {
        Some(0) => {
            return Err(ConfigError::Invalid("token.sweep_secs must be positive".into()).into())
        }
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_SWEEP_INTERVAL,
    };

    Ok(TokenSettings {
        backend: file.backend,
        ttl,
        signing_key,
        sweep_interval,
    })
}

/// Accept Go-style `:8080` as shorthand for all interfaces.
fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of 32 bytes of 0x01 and 0x02
    const KEY_1: &str = "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=";
    const KEY_2: &str = "AgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgI=";

    fn yaml(version: u32, extra: &str) -> String {
        format!(
            "addr: \":9000\"\nversion: {version}\nsecrets:\n  - version: 1\n    key: \"{KEY_1}\"\n  - version: 2\n    key: \"{KEY_2}\"\n{extra}"
        )
    }

    #[test]
    fn test_minimal_config() {
        let config = ServerConfig::from_yaml(&yaml(2, "")).unwrap();

        assert_eq!(config.addr, "0.0.0.0:9000");
        assert_eq!(config.version, 2);
        assert_eq!(config.registry.versions().collect::<Vec<_>>(), vec![1, 2]);
        assert!(config.database.is_none());
        assert_eq!(config.token.backend, TokenBackend::Session);
        assert_eq!(config.token.ttl, DEFAULT_TTL);
        assert!(config.token.signing_key.is_none());
    }

    #[test]
    fn test_token_section() {
        let extra = format!(
            "database: /tmp/crusia.db\ntoken:\n  backend: signed\n  ttl_secs: 60\n  signing_key: \"{KEY_1}\"\n"
        );
        let config = ServerConfig::from_yaml(&yaml(1, &extra)).unwrap();

        assert_eq!(config.database, Some(PathBuf::from("/tmp/crusia.db")));
        assert_eq!(config.token.backend, TokenBackend::Signed);
        assert_eq!(config.token.ttl, Duration::from_secs(60));
        assert!(config.token.signing_key.is_some());
    }

    #[test]
    fn test_current_version_must_exist() {
        let err = ServerConfig::from_yaml(&yaml(3, "")).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Config(ConfigError::CurrentVersionMissing(3))
        ));
    }

    #[test]
    fn test_bad_secrets_are_fatal() {
        let text = "version: 1\nsecrets:\n  - version: 1\n    key: \"not base64!\"\n";
        let err = ServerConfig::from_yaml(text).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Config(ConfigError::InvalidEncoding { version: 1, .. })
        ));

        let text = "version: 1\nsecrets:\n  - version: 1\n    key: \"AQID\"\n";
        let err = ServerConfig::from_yaml(text).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Config(ConfigError::InvalidKeyLength { version: 1, .. })
        ));

        let text = format!(
            "version: 1\nsecrets:\n  - version: 1\n    key: \"{KEY_1}\"\n  - version: 1\n    key: \"{KEY_2}\"\n"
        );
        let err = ServerConfig::from_yaml(&text).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Config(ConfigError::DuplicateVersion(1))
        ));
    }

    #[test]
    fn test_bad_token_settings() {
        let err = ServerConfig::from_yaml(&yaml(1, "token:\n  ttl_secs: 0\n")).unwrap_err();
        assert!(matches!(err, ServerError::Config(ConfigError::Invalid(_))));

        let err =
            ServerConfig::from_yaml(&yaml(1, "token:\n  signing_key: \"AQID\"\n")).unwrap_err();
        assert!(matches!(err, ServerError::Config(ConfigError::Invalid(_))));

        let err = ServerConfig::from_yaml(&yaml(1, "token:\n  backend: jwt\n")).unwrap_err();
        assert!(matches!(err, ServerError::Parse(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ServerConfig::from_yaml(&yaml(1, "extra: true\n")).unwrap_err();
        assert!(matches!(err, ServerError::Parse(_)));
    }

    #[test]
    fn test_addr_override() {
        let config = ServerConfig::from_yaml(&yaml(1, ""))
            .unwrap()
            .with_addr(":7000");
        assert_eq!(config.addr, "0.0.0.0:7000");
    }
}
