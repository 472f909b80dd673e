//! User persistence.
//!
//! [`UserStore`] is the seam between the auth services and the database.
//! Username uniqueness is the store's job: an insert that collides with an
//! existing row reports [`StoreError::AlreadyExists`], even when the caller's
//! earlier lookup saw no such user.

#[cfg(test)]
pub(crate) mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A row of the `users` table.
#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    AlreadyExists,
    #[error("database operation timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Create a user. Atomic: either the row exists afterwards or nothing was written.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
