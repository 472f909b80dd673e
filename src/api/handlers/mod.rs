//! Route handlers.
//!
//! Handlers only translate between JSON and the auth services; status codes
//! come from [`crate::auth::AuthError`]'s `IntoResponse` impl in [`error`].

pub mod error;
pub mod health;
pub mod signin;
pub mod signup;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body shared by `/signup` and `/signin`. Absent fields deserialize
/// as empty strings so they fail validation instead of the JSON extractor.
#[derive(ToSchema, Serialize, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
