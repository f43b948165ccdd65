//! # Crusia Server
//!
//! Process wiring for the Crusia save service.
//!
//! ## Overview
//!
//! - [`config`] loads and validates the YAML configuration
//! - [`Service`] bundles the decryption gateway, token manager and store
//!   behind the capability trait the HTTP layer consumes
//! - [`run`] binds the listener and serves until SIGINT/SIGTERM
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crusia_server::{run, ServerConfig};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = ServerConfig::load("config.yaml")?;
//!     run(config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod telemetry;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crusia_api::AppState;
use crusia_auth::{SessionTable, SignedTokens, TokenKeypair, TokenManager};
use crusia_store::{MemoryStore, SqliteStore, Store};

pub use config::{ServerConfig, TokenBackend, TokenSettings};
pub use error::{Result, ServerError};
pub use service::Service;

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;

    let listener = TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", config.addr))?;

    let addr = listener.local_addr()?;
    info!(
        %addr,
        version = config.version,
        secrets = config.registry.len(),
        "http server listening"
    );

    serve(listener, state, shutdown_signal()).await
}

/// Serve the router on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, crusia_api::router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(anyhow::Error::from)
}

/// Open the store and token manager described by `config`.
///
/// Must be called inside a tokio runtime: the session backend starts a
/// background sweeper.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    match &config.database {
        Some(path) => {
            info!(path = %path.display(), "opening sqlite store");
            let store = SqliteStore::open(path)?;
            Ok(state_with_store(config, store))
        }
        None => {
            warn!("no database configured; saves are kept in memory");
            Ok(state_with_store(config, MemoryStore::new()))
        }
    }
}

fn state_with_store<S: Store + 'static>(config: &ServerConfig, store: S) -> AppState {
    let tokens: Arc<dyn TokenManager> = match config.token.backend {
        TokenBackend::Signed => {
            let keypair = config.token.signing_key.clone().unwrap_or_else(|| {
                warn!("no token signing key configured; tokens will not survive a restart");
                TokenKeypair::generate()
            });
            Arc::new(SignedTokens::new(keypair, config.token.ttl))
        }
        TokenBackend::Session => {
            let table = Arc::new(SessionTable::new(config.token.ttl));
            spawn_sweeper(&table, config.token.sweep_interval);
            table
        }
    };

    let service = Service::new(config.version, config.registry.clone(), tokens, store);
    AppState::new(Arc::new(service))
}

/// Periodically drop expired sessions. Stops once the table is dropped.
fn spawn_sweeper(table: &Arc<SessionTable>, every: Duration) {
    let table = Arc::downgrade(table);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(table) = table.upgrade() else {
                break;
            };
            let removed = table.sweep();
            if removed > 0 {
                debug!(removed, remaining = table.len(), "expired sessions swept");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(?err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
