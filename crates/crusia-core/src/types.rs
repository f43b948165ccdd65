//! Records shared between the store and the service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Save payload every account starts with.
pub const EMPTY_SAVE: &str = "{}";

/// Store-assigned user identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub passhash: String,
}

/// An account that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub passhash: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, passhash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            passhash: passhash.into(),
        }
    }

    /// Attach a store-assigned id.
    pub fn with_id(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            passhash: self.passhash,
        }
    }
}

/// The single save blob owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub user_id: UserId,
    /// Unix milliseconds of the accepted write.
    pub edited_at: i64,
    /// Decrypted plaintext, stored verbatim.
    pub payload: String,
}

impl SaveData {
    /// The record created alongside a new account.
    pub fn empty(user_id: UserId, edited_at: i64) -> Self {
        Self {
            user_id,
            edited_at,
            payload: EMPTY_SAVE.to_string(),
        }
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
