use super::{AuthError, AuthenticatedUser};
use crate::{
    password::{PasswordHasher, MAX_PASSWORD_BYTES},
    users::UserStore,
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct SigninService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl SigninService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Check a username/password pair.
    ///
    /// An unknown username and a wrong password are indistinguishable to the
    /// caller: both return [`AuthError::InvalidCredentials`], and both pay for
    /// one bcrypt verification. Passwords longer than bcrypt's input limit
    /// never match, since bcrypt would only compare their first 72 bytes.
    ///
    /// # Errors
    /// [`AuthError::MissingCredentials`] if either field is empty,
    /// [`AuthError::InvalidCredentials`] on mismatch, [`AuthError::Storage`]
    /// or [`AuthError::Hash`] on infrastructure failure.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if password.len() > MAX_PASSWORD_BYTES {
            self.hasher.verify_dummy(password).await?;
            debug!("password exceeds bcrypt input limit");
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            self.hasher.verify_dummy(password).await?;
            debug!("unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = %user.id, "sign-in successful");

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
        })
    }
}

impl std::fmt::Debug for SigninService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigninService")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
