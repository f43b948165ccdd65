//! Test fixtures and helpers.
//!
//! A [`TestFixture`] is a fully wired in-memory service plus the client-side
//! half of the protocol: sealing saves and driving the HTTP routes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use crusia_api::AppState;
use crusia_auth::SessionTable;
use crusia_core::{DecryptionGateway, Secret, SecretRegistry, KEY_LEN};
use crusia_server::Service;
use crusia_store::MemoryStore;

/// The service type every fixture runs.
pub type TestService = Service<MemoryStore, SessionTable>;

/// Deterministic key material for a version.
pub fn secret_key(version: u32) -> Vec<u8> {
    let seed = version.to_le_bytes();
    (0..KEY_LEN).map(|i| seed[i % 4] ^ (i as u8)).collect()
}

/// A registry holding `versions`, keyed by [`secret_key`].
pub fn registry(versions: &[u32]) -> SecretRegistry {
    let secrets = versions.iter().map(|&v| Secret::new(v, secret_key(v)));
    match SecretRegistry::load(secrets) {
        Ok(registry) => registry,
        Err(err) => panic!("fixture registry: {err}"),
    }
}

/// A response reduced to what tests assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    /// Decode the body as a JSON string.
    pub fn json_string(&self) -> String {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body {:?} is not a JSON string: {e}", self.body))
    }

    /// The `error` kind of an error body.
    pub fn error_kind(&self) -> String {
        let value: serde_json::Value = serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body {:?} is not JSON: {e}", self.body));
        value["error"].as_str().unwrap_or_default().to_string()
    }
}

/// An in-memory service with versions 1 and 2 registered, advertising 2.
pub struct TestFixture {
    pub service: Arc<TestService>,
    router: Router,
    /// Client-side view of the keys, used to seal saves.
    client: DecryptionGateway,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_versions(&[1, 2], 2)
    }

    /// Register `versions` and advertise `current`.
    pub fn with_versions(versions: &[u32], current: u32) -> Self {
        Self::with_ttl(versions, current, Duration::from_secs(3600))
    }

    pub fn with_ttl(versions: &[u32], current: u32, ttl: Duration) -> Self {
        let registry = Arc::new(registry(versions));
        let service = Arc::new(Service::new(
            current,
            registry.clone(),
            SessionTable::new(ttl),
            MemoryStore::new(),
        ));
        let router = crusia_api::router(AppState::new(service.clone()));

        Self {
            service,
            router,
            client: DecryptionGateway::new(registry),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        self.service.backing_store()
    }

    pub fn sessions(&self) -> &SessionTable {
        self.service.tokens()
    }

    /// Seal `plaintext` under `key_version` into a set-save body.
    pub fn seal(&self, key_version: u32, plaintext: &[u8]) -> String {
        match self.client.seal(key_version, plaintext) {
            Ok(sealed) => sealed.to_base64(),
            Err(err) => panic!("fixture has no key for version {key_version}: {err}"),
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();

        Reply {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn version(&self) -> Reply {
        self.send(get("/version")).await
    }

    pub async fn register(&self, username: &str, passhash: &str) -> Reply {
        self.send(post("/register", credentials(username, passhash)))
            .await
    }

    pub async fn login(&self, username: &str, passhash: &str) -> Reply {
        self.send(post("/login", credentials(username, passhash)))
            .await
    }

    /// Register then log in, returning the token.
    pub async fn signup(&self, username: &str, passhash: &str) -> String {
        let reply = self.register(username, passhash).await;
        assert_eq!(reply.status, StatusCode::OK, "register {username}: {reply:?}");

        let reply = self.login(username, passhash).await;
        assert_eq!(reply.status, StatusCode::OK, "login {username}: {reply:?}");
        reply.json_string()
    }

    pub async fn get_save(&self, token: &str) -> Reply {
        self.send(authed("/save/get", token, Body::empty())).await
    }

    /// Post a raw set-save body declared as `version`.
    pub async fn set_save_raw(&self, token: &str, version: &str, body: impl Into<Body>) -> Reply {
        let request = Request::post("/save/set")
            .header("x-authorization", token)
            .header("x-save-version", version)
            .body(body.into())
            .unwrap_or_else(|e| panic!("bad request: {e}"));
        self.send(request).await
    }

    /// Seal `plaintext` under `version` and post it.
    pub async fn set_save(&self, token: &str, version: u32, plaintext: &str) -> Reply {
        let body = self.seal(version, plaintext.as_bytes());
        self.set_save_raw(token, &version.to_string(), body).await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn credentials(username: &str, passhash: &str) -> String {
    serde_json::json!({ "username": username, "passhash": passhash }).to_string()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("bad request: {e}"))
}

fn post(uri: &str, body: String) -> Request<Body> {
    Request::post(uri)
        .body(Body::from(body))
        .unwrap_or_else(|e| panic!("bad request: {e}"))
}

fn authed(uri: &str, token: &str, body: Body) -> Request<Body> {
    Request::post(uri)
        .header("x-authorization", token)
        .body(body)
        .unwrap_or_else(|e| panic!("bad request: {e}"))
}
