//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::debug;

use crusia_core::{NewUser, SaveData, User, UserId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Store, UpdateResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Internal(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("spawn_blocking failed: {}", e)))?
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get("id")?),
        username: row.get("username")?,
        passhash: row.get("passhash")?,
    })
}

fn row_to_save(row: &rusqlite::Row<'_>) -> rusqlite::Result<SaveData> {
    Ok(SaveData {
        user_id: UserId::new(row.get("user_id")?),
        edited_at: row.get("edited_at")?,
        payload: row.get("payload")?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn insert_user(conn: &Connection, user: &NewUser) -> Result<User> {
    match conn.execute(
        "INSERT INTO users (username, passhash) VALUES (?1, ?2)",
        params![user.username, user.passhash],
    ) {
        Ok(_) => Ok(user.clone().with_id(UserId::new(conn.last_insert_rowid()))),
        Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict(format!(
            "username {} is taken",
            user.username
        ))),
        Err(e) => Err(e.into()),
    }
}

fn insert_save(conn: &Connection, data: &SaveData) -> Result<()> {
    match conn.execute(
        "INSERT INTO save_data (user_id, edited_at, payload) VALUES (?1, ?2, ?3)",
        params![data.user_id.get(), data.edited_at, data.payload],
    ) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict(format!(
            "user {} already has save data",
            data.user_id
        ))),
        Err(e) => Err(e.into()),
    }
}

fn user_exists(conn: &Connection, id: UserId) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![id.get()],
        |row| row.get(0),
    )?)
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, username, passhash FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, username, passhash FROM users WHERE id = ?1",
                params![id.get()],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let user = user.clone();
        self.blocking(move |conn| insert_user(conn, &user)).await
    }

    async fn create_save_data(&self, data: &SaveData) -> Result<()> {
        let data = data.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            if !user_exists(&tx, data.user_id)? {
                return Err(StoreError::NotFound(format!("user {}", data.user_id)));
            }
            insert_save(&tx, &data)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_save_data(&self, user_id: UserId) -> Result<Option<SaveData>> {
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT user_id, edited_at, payload FROM save_data WHERE user_id = ?1",
                params![user_id.get()],
                row_to_save,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn update_save_data(&self, data: &SaveData) -> Result<UpdateResult> {
        let data = data.clone();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE save_data SET payload = ?1, edited_at = ?2
                 WHERE user_id = ?3 AND edited_at <= ?2",
                params![data.payload, data.edited_at, data.user_id.get()],
            )?;

            if changed == 1 {
                return Ok(UpdateResult::Applied);
            }

            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM save_data WHERE user_id = ?1)",
                params![data.user_id.get()],
                |row| row.get(0),
            )?;

            if exists {
                debug!(user_id = %data.user_id, edited_at = data.edited_at, "stale save update dropped");
                Ok(UpdateResult::Superseded)
            } else {
                Err(StoreError::NotFound(format!(
                    "save data for user {}",
                    data.user_id
                )))
            }
        })
        .await
    }

    async fn create_account(
        &self,
        user: &NewUser,
        initial_payload: &str,
        edited_at: i64,
    ) -> Result<User> {
        let user = user.clone();
        let payload = initial_payload.to_string();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let created = insert_user(&tx, &user)?;
            insert_save(
                &tx,
                &SaveData {
                    user_id: created.id,
                    edited_at,
                    payload,
                },
            )?;
            tx.commit()?;
            Ok(created)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crusia_core::EMPTY_SAVE;

    #[tokio::test]
    async fn test_sqlite_account_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let user = store
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 5)
            .await
            .unwrap();

        let found = store.get_user_by_username("a").await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(store.get_user(user.id).await.unwrap(), Some(user.clone()));

        let save = store.get_save_data(user.id).await.unwrap().unwrap();
        assert_eq!(save, SaveData::empty(user.id, 5));
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_username() {
        let store = SqliteStore::open_memory().unwrap();
        store.create_user(&NewUser::new("a", "h1")).await.unwrap();

        let err = store
            .create_account(&NewUser::new("a", "h2"), EMPTY_SAVE, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_sqlite_last_write_wins() {
        let store = SqliteStore::open_memory().unwrap();
        let user = store
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 10)
            .await
            .unwrap();

        let result = store
            .update_save_data(&SaveData {
                user_id: user.id,
                edited_at: 20,
                payload: "{\"x\":1}".into(),
            })
            .await
            .unwrap();
        assert_eq!(result, UpdateResult::Applied);

        let result = store
            .update_save_data(&SaveData {
                user_id: user.id,
                edited_at: 15,
                payload: "{\"x\":0}".into(),
            })
            .await
            .unwrap();
        assert_eq!(result, UpdateResult::Superseded);

        let save = store.get_save_data(user.id).await.unwrap().unwrap();
        assert_eq!(save.payload, "{\"x\":1}");
    }

    #[tokio::test]
    async fn test_sqlite_update_missing_user() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .update_save_data(&SaveData::empty(UserId::new(3), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sqlite_create_save_data_rules() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .create_save_data(&SaveData::empty(UserId::new(1), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let user = store.create_user(&NewUser::new("a", "h1")).await.unwrap();
        store
            .create_save_data(&SaveData::empty(user.id, 1))
            .await
            .unwrap();
        let err = store
            .create_save_data(&SaveData::empty(user.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crusia.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store
                .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 1)
                .await
                .unwrap()
                .id
        };

        let store = SqliteStore::open(&path).unwrap();
        let user = store.get_user_by_username("a").await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(store.get_save_data(id).await.unwrap().is_some());
    }
}
