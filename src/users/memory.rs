//! In-memory [`UserStore`] for handler and service tests.

use super::{StoreError, User, UserStore};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were down.
    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub(crate) fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let users = self.users.lock().map_err(|_| StoreError::Timeout)?;
        Ok(users.get(username).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.check_available()?;
        let mut users = self.users.lock().map_err(|_| StoreError::Timeout)?;
        if users.contains_key(username) {
            return Err(StoreError::AlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.insert(username.to_string(), user.clone());

        Ok(user)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
