//! Store trait: the abstract interface for account and save persistence.
//!
//! The service is storage-agnostic. Implementations include SQLite
//! (primary) and in-memory.

use async_trait::async_trait;
use crusia_core::{NewUser, SaveData, User, UserId};

use crate::error::Result;

/// Result of a save update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The update replaced the stored save.
    Applied,
    /// A write with a later `edited_at` is already stored; nothing changed.
    Superseded,
}

/// The Store trait: async interface for account and save persistence.
///
/// # Design Notes
///
/// - Implementations enforce username uniqueness and one save per user.
/// - `update_save_data` for one user is serialized by the store; updates for
///   different users proceed independently.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up a user by unique username.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Look up a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Create a user, assigning its id.
    ///
    /// Returns `Conflict` if the username is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    // ─────────────────────────────────────────────────────────────────────────
    // Saves
    // ─────────────────────────────────────────────────────────────────────────

    /// Create the save record for a user.
    ///
    /// Returns `Conflict` if the user already has one and `NotFound` if the
    /// user does not exist.
    async fn create_save_data(&self, data: &SaveData) -> Result<()>;

    /// Get the save record for a user.
    async fn get_save_data(&self, user_id: UserId) -> Result<Option<SaveData>>;

    /// Replace a user's save, last write wins by `edited_at`.
    ///
    /// Returns `NotFound` if the user has no save record.
    async fn update_save_data(&self, data: &SaveData) -> Result<UpdateResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a user together with its initial save.
    ///
    /// Either both records exist afterwards or neither does.
    async fn create_account(
        &self,
        user: &NewUser,
        initial_payload: &str,
        edited_at: i64,
    ) -> Result<User>;
}
