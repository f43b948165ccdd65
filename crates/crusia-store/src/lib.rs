//! # Crusia Store
//!
//! Storage abstraction for Crusia accounts and save blobs. Provides a
//! trait-based interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The service depends only on the [`Store`] trait. The primary
//! implementation is [`SqliteStore`]; [`MemoryStore`] backs tests and
//! deployments that run without a database file.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage
//! - [`UpdateResult`] - Outcome of a last-write-wins save update
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crusia_store::{SqliteStore, Store};
//! use crusia_core::{NewUser, now_millis, EMPTY_SAVE};
//!
//! async fn example() {
//!     let store = SqliteStore::open("crusia.db").unwrap();
//!
//!     let user = store
//!         .create_account(&NewUser::new("alice", "hash"), EMPTY_SAVE, now_millis())
//!         .await
//!         .unwrap();
//!     let save = store.get_save_data(user.id).await.unwrap();
//!     assert!(save.is_some());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unique usernames**: `create_user` returns `Conflict` for a taken name
//! - **One save per user**: `create_save_data` returns `Conflict` if one exists
//! - **Atomic accounts**: `create_account` creates the user and its save together
//! - **Last write wins**: an update older than the stored `edited_at` is dropped

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, UpdateResult};
