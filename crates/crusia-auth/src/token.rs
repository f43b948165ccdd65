//! The token manager contract.

use std::sync::Arc;
use std::time::Duration;

use crusia_core::UserId;

use crate::error::Result;

/// Lifetime of a token when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Issues opaque tokens and resolves them back to the user they were
/// issued for.
///
/// Both operations are computational; implementations are called from
/// request tasks concurrently and must be internally synchronized.
pub trait TokenManager: Send + Sync {
    /// Issue a token for a user.
    fn create(&self, user: UserId) -> Result<String>;

    /// Resolve a token to its user.
    ///
    /// Any malformed, unknown, tampered or expired token yields
    /// `TokenError::Invalid`.
    fn resolve(&self, token: &str) -> Result<UserId>;
}

impl<T: TokenManager + ?Sized> TokenManager for Arc<T> {
    fn create(&self, user: UserId) -> Result<String> {
        (**self).create(user)
    }

    fn resolve(&self, token: &str) -> Result<UserId> {
        (**self).resolve(token)
    }
}

impl<T: TokenManager + ?Sized> TokenManager for Box<T> {
    fn create(&self, user: UserId) -> Result<String> {
        (**self).create(user)
    }

    fn resolve(&self, token: &str) -> Result<UserId> {
        (**self).resolve(token)
    }
}

/// Current time in Unix seconds.
pub fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub(crate) fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}
