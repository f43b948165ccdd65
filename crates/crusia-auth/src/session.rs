//! Server-side session table.
//!
//! Tokens are 32 random bytes, hex encoded. The table stores the Blake3
//! hash of each token, never the token itself.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rand::RngCore;
use tracing::debug;

use crusia_core::UserId;

use crate::error::{Result, TokenError};
use crate::token::{now_secs, ttl_secs, TokenManager};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Session {
    user: UserId,
    expires_at: i64,
}

/// In-memory token table with expiry.
#[derive(Debug)]
pub struct SessionTable {
    sessions: Mutex<HashMap<[u8; 32], Session>>,
    ttl: Duration,
}

fn session_key(token: &str) -> [u8; 32] {
    *blake3::hash(token.as_bytes()).as_bytes()
}

impl SessionTable {
    /// Create an empty table.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[u8; 32], Session>> {
        // A panic mid-insert leaves the map consistent.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    pub fn create_at(&self, user: UserId, now: i64) -> Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng()
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Creation(format!("rng: {}", e)))?;
        let token = hex::encode(bytes);

        let session = Session {
            user,
            expires_at: now.saturating_add(ttl_secs(self.ttl)),
        };
        self.lock().insert(session_key(&token), session);

        Ok(token)
    }

    /// Resolve a token as if the current time were `now` (Unix seconds).
    ///
    /// Expired entries are removed on sight.
    pub fn resolve_at(&self, token: &str, now: i64) -> Result<UserId> {
        if token.len() != TOKEN_BYTES * 2 {
            return Err(TokenError::Invalid);
        }

        let key = session_key(token);
        let mut sessions = self.lock();
        let session = *sessions.get(&key).ok_or(TokenError::Invalid)?;

        if now >= session.expires_at {
            sessions.remove(&key);
            debug!(user_id = %session.user, "session expired");
            return Err(TokenError::Invalid);
        }

        Ok(session.user)
    }

    /// Drop every session expired at `now`. Returns how many were removed.
    pub fn sweep_at(&self, now: i64) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| now < s.expires_at);
        before - sessions.len()
    }

    /// Drop every session that has expired.
    pub fn sweep(&self) -> usize {
        self.sweep_at(now_secs())
    }

    /// Number of live or not yet swept sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenManager for SessionTable {
    fn create(&self, user: UserId) -> Result<String> {
        self.create_at(user, now_secs())
    }

    fn resolve(&self, token: &str) -> Result<UserId> {
        self.resolve_at(token, now_secs())
    }
}
