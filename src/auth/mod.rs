//! Registration and sign-in.
//!
//! Both services are single-pass: validate, touch the store once or twice,
//! return. Nothing is persisted between steps, and each request is independent.

pub mod signin;
pub mod signup;

pub use signin::SigninService;
pub use signup::SignupService;

use crate::{password::HashError, users::StoreError};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 64;
pub const MIN_PASSWORD_CHARS: usize = 6;

pub const REQUIRED: &str = "Username and password are required";
pub const USERNAME_TOO_SHORT: &str = "Username too short";
pub const USERNAME_TOO_LONG: &str = "Username too long";
pub const PASSWORD_TOO_SHORT: &str = "Password too short";
pub const PASSWORD_TOO_LONG: &str = "Password too long";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Username already exists")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Outcome of a successful signup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub username: String,
}

/// Outcome of a successful sign-in. Never carries the password digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}
