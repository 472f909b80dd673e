//! bcrypt password hashing.
//!
//! Digests use the `$2b$` format with the salt embedded, so rows written by
//! other bcrypt implementations (e.g. passlib) verify unchanged. Hashing and
//! verification are CPU-bound and run on the blocking thread pool.

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use ulid::Ulid;

/// Work factor used unless configured otherwise; a verify costs tens of
/// milliseconds on current hardware.
pub const DEFAULT_COST: u32 = 10;

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("failed to hash password: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    cost: u32,
    /// Digest of a throwaway password at the same cost, verified against when
    /// a username does not exist so that path takes as long as a wrong password.
    dummy_digest: Arc<str>,
}

impl PasswordHasher {
    /// Build a hasher for `cost`. Computes one digest up front, so this blocks
    /// for a single hash duration.
    ///
    /// # Errors
    /// Returns an error if bcrypt rejects the cost (valid range is 4..=31).
    pub fn new(cost: u32) -> Result<Self, HashError> {
        let dummy_digest = bcrypt::hash(Ulid::new().to_string(), cost)?;

        Ok(Self {
            cost,
            dummy_digest: Arc::from(dummy_digest),
        })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plain` with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if bcrypt fails or the blocking task fails.
    pub async fn hash(&self, plain: &str) -> Result<String, HashError> {
        let plain = plain.to_string();
        let cost = self.cost;

        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;

        Ok(digest)
    }

    /// Check `plain` against `digest`. The digest comparison is constant-time.
    /// A digest that is not valid bcrypt never matches.
    ///
    /// # Errors
    /// Returns an error only if the blocking task fails.
    pub async fn verify(&self, plain: &str, digest: &str) -> Result<bool, HashError> {
        let plain = plain.to_string();
        let digest = digest.to_string();

        let result = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &digest)).await?;

        Ok(result.unwrap_or_else(|err| {
            warn!(error = %err, "stored password digest is not valid bcrypt");
            false
        }))
    }

    /// Burn one verification against the throwaway digest.
    ///
    /// # Errors
    /// Returns an error only if the blocking task fails.
    pub async fn verify_dummy(&self, plain: &str) -> Result<(), HashError> {
        self.verify(plain, &self.dummy_digest).await.map(|_| ())
    }
}
