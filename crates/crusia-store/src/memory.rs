//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite but keeps everything in memory with no
//! persistence. Each save lives in its own slot so writers for different
//! users never contend on the same lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crusia_core::{NewUser, SaveData, User, UserId};

use crate::error::{Result, StoreError};
use crate::traits::{Store, UpdateResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Lock order is always
/// `users` before `saves`.
pub struct MemoryStore {
    users: RwLock<UserTable>,
    saves: RwLock<HashMap<UserId, Arc<Mutex<SaveData>>>>,
}

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    by_name: HashMap<String, UserId>,
    next_id: i64,
}

impl UserTable {
    fn insert(&mut self, user: &NewUser) -> Result<User> {
        if self.by_name.contains_key(&user.username) {
            return Err(StoreError::Conflict(format!(
                "username {} is taken",
                user.username
            )));
        }

        self.next_id += 1;
        let created = user.clone().with_id(UserId::new(self.next_id));
        self.by_name.insert(created.username.clone(), created.id);
        self.by_id.insert(created.id, created.clone());
        Ok(created)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(UserTable::default()),
            saves: RwLock::new(HashMap::new()),
        }
    }

    fn users(&self) -> Result<RwLockReadGuard<'_, UserTable>> {
        self.users.read().map_err(|e| poisoned(&e))
    }

    fn users_mut(&self) -> Result<RwLockWriteGuard<'_, UserTable>> {
        self.users.write().map_err(|e| poisoned(&e))
    }

    fn saves(&self) -> Result<RwLockReadGuard<'_, HashMap<UserId, Arc<Mutex<SaveData>>>>> {
        self.saves.read().map_err(|e| poisoned(&e))
    }

    fn saves_mut(&self) -> Result<RwLockWriteGuard<'_, HashMap<UserId, Arc<Mutex<SaveData>>>>> {
        self.saves.write().map_err(|e| poisoned(&e))
    }

    fn slot(&self, user_id: UserId) -> Result<Option<Arc<Mutex<SaveData>>>> {
        Ok(self.saves()?.get(&user_id).cloned())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(e: &dyn std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("lock poisoned: {}", e))
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users()?;
        Ok(users
            .by_name
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users()?.by_id.get(&id).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.users_mut()?.insert(user)
    }

    async fn create_save_data(&self, data: &SaveData) -> Result<()> {
        let users = self.users()?;
        if !users.by_id.contains_key(&data.user_id) {
            return Err(StoreError::NotFound(format!("user {}", data.user_id)));
        }

        let mut saves = self.saves_mut()?;
        if saves.contains_key(&data.user_id) {
            return Err(StoreError::Conflict(format!(
                "user {} already has save data",
                data.user_id
            )));
        }
        saves.insert(data.user_id, Arc::new(Mutex::new(data.clone())));
        Ok(())
    }

    async fn get_save_data(&self, user_id: UserId) -> Result<Option<SaveData>> {
        match self.slot(user_id)? {
            Some(slot) => {
                let save = slot.lock().map_err(|e| poisoned(&e))?;
                Ok(Some(save.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_save_data(&self, data: &SaveData) -> Result<UpdateResult> {
        let slot = self
            .slot(data.user_id)?
            .ok_or_else(|| StoreError::NotFound(format!("save data for user {}", data.user_id)))?;

        let mut save = slot.lock().map_err(|e| poisoned(&e))?;
        if data.edited_at < save.edited_at {
            return Ok(UpdateResult::Superseded);
        }
        save.edited_at = data.edited_at;
        save.payload = data.payload.clone();
        Ok(UpdateResult::Applied)
    }

    async fn create_account(
        &self,
        user: &NewUser,
        initial_payload: &str,
        edited_at: i64,
    ) -> Result<User> {
        let mut users = self.users_mut()?;
        let mut saves = self.saves_mut()?;

        let created = users.insert(user)?;
        saves.insert(
            created.id,
            Arc::new(Mutex::new(SaveData {
                user_id: created.id,
                edited_at,
                payload: initial_payload.to_string(),
            })),
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crusia_core::EMPTY_SAVE;

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let store = MemoryStore::new();
        let user = store.create_user(&NewUser::new("a", "h1")).await.unwrap();

        let by_name = store.get_user_by_username("a").await.unwrap().unwrap();
        assert_eq!(by_name, user);
        assert_eq!(store.get_user(user.id).await.unwrap(), Some(user));
        assert_eq!(store.get_user_by_username("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user(&NewUser::new("a", "h1")).await.unwrap();

        let err = store.create_user(&NewUser::new("a", "h2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_account_creates_save() {
        let store = MemoryStore::new();
        let user = store
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 100)
            .await
            .unwrap();

        let save = store.get_save_data(user.id).await.unwrap().unwrap();
        assert_eq!(save.payload, "{}");
        assert_eq!(save.edited_at, 100);
    }

    #[tokio::test]
    async fn test_create_account_conflict_leaves_nothing() {
        let store = MemoryStore::new();
        store
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 1)
            .await
            .unwrap();

        let err = store
            .create_account(&NewUser::new("a", "h2"), EMPTY_SAVE, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get_save_data(UserId::new(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_last_write_wins() {
        let store = MemoryStore::new();
        let user = store
            .create_account(&NewUser::new("a", "h1"), EMPTY_SAVE, 10)
            .await
            .unwrap();

        let newer = SaveData {
            user_id: user.id,
            edited_at: 30,
            payload: "{\"x\":2}".into(),
        };
        let older = SaveData {
            user_id: user.id,
            edited_at: 20,
            payload: "{\"x\":1}".into(),
        };

        assert_eq!(
            store.update_save_data(&newer).await.unwrap(),
            UpdateResult::Applied
        );
        assert_eq!(
            store.update_save_data(&older).await.unwrap(),
            UpdateResult::Superseded
        );

        let save = store.get_save_data(user.id).await.unwrap().unwrap();
        assert_eq!(save.payload, "{\"x\":2}");
        assert_eq!(save.edited_at, 30);
    }

    #[tokio::test]
    async fn test_update_missing_save_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_save_data(&SaveData::empty(UserId::new(9), 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_save_data_rules() {
        let store = MemoryStore::new();
        let missing = store
            .create_save_data(&SaveData::empty(UserId::new(1), 1))
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound(_)));

        let user = store.create_user(&NewUser::new("a", "h1")).await.unwrap();
        store
            .create_save_data(&SaveData::empty(user.id, 1))
            .await
            .unwrap();
        let dup = store
            .create_save_data(&SaveData::empty(user.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));
    }
}
