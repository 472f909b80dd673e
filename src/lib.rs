//! # shopauth (user registration & sign-in)
//!
//! `shopauth` exposes two JSON endpoints, `POST /signup` and `POST /signin`,
//! backed by a Postgres `users` table.
//!
//! ## Credentials
//!
//! Database connection parameters come either from flags/environment variables
//! or from a Vault KV v2 secret. The resolved configuration is cached as an
//! immutable snapshot and can be force-refreshed to follow secret rotation.
//!
//! ## Passwords
//!
//! Passwords are stored as salted bcrypt digests. Sign-in never reveals whether
//! a username exists: unknown users and wrong passwords return the same
//! `401 Invalid credentials` response.
//!
//! ## Usernames
//!
//! Usernames are case-sensitive, 3 to 64 characters long, and unique. Uniqueness
//! is enforced by the database so concurrent signups for the same name yield
//! exactly one account.

pub mod api;
pub mod auth;
pub mod cli;
pub mod credentials;
pub mod password;
pub mod users;
pub mod vault;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
