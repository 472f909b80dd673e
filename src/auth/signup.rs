use super::{
    AuthError, RegisteredUser, MAX_USERNAME_CHARS, MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS,
    PASSWORD_TOO_LONG, PASSWORD_TOO_SHORT, REQUIRED, USERNAME_TOO_LONG, USERNAME_TOO_SHORT,
};
use crate::{
    password::{PasswordHasher, MAX_PASSWORD_BYTES},
    users::{StoreError, UserStore},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Check signup input. Rules apply in order and the first failure wins.
///
/// # Errors
/// Returns [`AuthError::Validation`] naming the first rule broken.
pub fn validate(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(REQUIRED));
    }

    let username_chars = username.chars().count();
    if username_chars < MIN_USERNAME_CHARS {
        return Err(AuthError::Validation(USERNAME_TOO_SHORT));
    }
    if username_chars > MAX_USERNAME_CHARS {
        return Err(AuthError::Validation(USERNAME_TOO_LONG));
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::Validation(PASSWORD_TOO_SHORT));
    }
    // bcrypt ignores everything past 72 bytes
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation(PASSWORD_TOO_LONG));
    }

    Ok(())
}

#[derive(Clone)]
pub struct SignupService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl SignupService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Validate, hash and persist a new user.
    ///
    /// The lookup before the insert only gives early feedback; the unique
    /// constraint decides when two signups race for the same name.
    ///
    /// # Errors
    /// [`AuthError::Validation`] for bad input, [`AuthError::AlreadyExists`]
    /// when the username is taken, [`AuthError::Storage`] or
    /// [`AuthError::Hash`] for anything else.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisteredUser, AuthError> {
        validate(username, password)?;

        if self.store.find_by_username(username).await?.is_some() {
            debug!("username already taken");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.hasher.hash(password).await?;

        match self.store.insert_user(username, &password_hash).await {
            Ok(user) => {
                info!(user_id = %user.id, "user registered");
                Ok(RegisteredUser {
                    id: user.id,
                    username: user.username,
                })
            }
            Err(StoreError::AlreadyExists) => {
                debug!("username taken by a concurrent signup");
                Err(AuthError::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for SignupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupService")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
