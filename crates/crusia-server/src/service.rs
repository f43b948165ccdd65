//! The concrete capability set handed to the HTTP layer.

use std::sync::Arc;

use crusia_api::Capabilities;
use crusia_auth::{TokenError, TokenManager};
use crusia_core::{DecryptionGateway, GatewayError, SecretRegistry, UserId};
use crusia_store::Store;

/// Bundles the decryption gateway, token manager and store.
///
/// Every field is either immutable or internally synchronized, so one
/// instance serves all requests.
pub struct Service<S: Store, T: TokenManager> {
    version: u32,
    gateway: DecryptionGateway,
    tokens: T,
    store: Arc<S>,
}

impl<S: Store, T: TokenManager> Service<S, T> {
    /// Create a service advertising `version`.
    pub fn new(version: u32, registry: Arc<SecretRegistry>, tokens: T, store: S) -> Self {
        Self::with_shared_store(version, registry, tokens, Arc::new(store))
    }

    /// Create a service over a store shared with other owners.
    pub fn with_shared_store(
        version: u32,
        registry: Arc<SecretRegistry>,
        tokens: T,
        store: Arc<S>,
    ) -> Self {
        Self {
            version,
            gateway: DecryptionGateway::new(registry),
            tokens,
            store,
        }
    }

    pub fn gateway(&self) -> &DecryptionGateway {
        &self.gateway
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    /// The store, with its concrete type.
    pub fn backing_store(&self) -> &S {
        &self.store
    }
}

impl<S, T> Capabilities for Service<S, T>
where
    S: Store + 'static,
    T: TokenManager + 'static,
{
    fn current_version(&self) -> u32 {
        self.version
    }

    fn decrypt_save(&self, version: u32, body: &[u8]) -> Result<Vec<u8>, GatewayError> {
        self.gateway.decrypt_wire(version, body)
    }

    fn create_token(&self, user: UserId) -> Result<String, TokenError> {
        self.tokens.create(user)
    }

    fn resolve_token(&self, token: &str) -> Result<UserId, TokenError> {
        self.tokens.resolve(token)
    }

    fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crusia_auth::SessionTable;
    use crusia_core::{NewUser, Secret, EMPTY_SAVE};
    use crusia_store::MemoryStore;

    fn service() -> Service<MemoryStore, SessionTable> {
        let registry = SecretRegistry::load([
            Secret::new(1, vec![1u8; 32]),
            Secret::new(2, vec![2u8; 32]),
        ])
        .unwrap();
        Service::new(
            2,
            Arc::new(registry),
            SessionTable::new(Duration::from_secs(60)),
            MemoryStore::new(),
        )
    }

    #[test]
    fn test_decrypt_save_wire() {
        let service = service();
        let wire = service.gateway().seal(1, b"{}").unwrap().to_base64();

        assert_eq!(service.current_version(), 2);
        assert_eq!(service.decrypt_save(1, wire.as_bytes()).unwrap(), b"{}");
        assert_eq!(
            service.decrypt_save(2, wire.as_bytes()),
            Err(GatewayError::DecryptionFailed)
        );
        assert_eq!(
            service.decrypt_save(7, wire.as_bytes()),
            Err(GatewayError::UnknownVersion(7))
        );
    }

    #[test]
    fn test_tokens() {
        let service = service();
        let token = service.create_token(UserId::new(3)).unwrap();
        assert_eq!(service.resolve_token(&token).unwrap(), UserId::new(3));
        assert_eq!(service.resolve_token("nope"), Err(TokenError::Invalid));
    }

    #[tokio::test]
    async fn test_store_is_shared() {
        let service = service();
        let user = service
            .store()
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 1)
            .await
            .unwrap();

        let found = service.backing_store().get_user(user.id).await.unwrap();
        assert_eq!(found, Some(user));
    }
}
