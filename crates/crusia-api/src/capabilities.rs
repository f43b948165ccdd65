//! The narrow set of services the HTTP layer depends on.

use crusia_auth::TokenError;
use crusia_core::{GatewayError, UserId};
use crusia_store::Store;

/// Everything a request handler may ask of the process.
///
/// Implemented once by the server; tests substitute their own.
pub trait Capabilities: Send + Sync + 'static {
    /// Save format version clients should encrypt with.
    fn current_version(&self) -> u32;

    /// Decrypt a set-save request body declared as `version`.
    ///
    /// `body` is the raw request body as received on the wire.
    fn decrypt_save(&self, version: u32, body: &[u8]) -> Result<Vec<u8>, GatewayError>;

    /// Issue a token for a user.
    fn create_token(&self, user: UserId) -> Result<String, TokenError>;

    /// Resolve a token back to its user id.
    fn resolve_token(&self, token: &str) -> Result<UserId, TokenError>;

    /// Backing store for users and saves.
    fn store(&self) -> &dyn Store;
}
