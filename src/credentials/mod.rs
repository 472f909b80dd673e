//! Database connection parameters and where they come from.
//!
//! A [`CredentialSource`] produces a possibly incomplete [`PartialConfig`];
//! [`CredentialStore`] validates it into a [`ConnectionConfig`] and caches the
//! result as an immutable snapshot. Refreshing swaps the snapshot pointer, so
//! readers never observe a half-updated config.

pub mod refresh;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

pub const DEFAULT_DATABASE: &str = "postgres";
pub const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing required connection fields: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("failed to fetch connection config: {0:#}")]
    Fetch(anyhow::Error),
}

/// Connection fields as delivered by a source, before validation.
#[derive(Clone, Default)]
pub struct PartialConfig {
    pub host: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub port: Option<u16>,
}

impl PartialConfig {
    /// Fill every field that is unset here from `fallback`.
    #[must_use]
    pub fn or(self, fallback: &Self) -> Self {
        Self {
            host: self.host.or_else(|| fallback.host.clone()),
            database: self.database.or_else(|| fallback.database.clone()),
            user: self.user.or_else(|| fallback.user.clone()),
            password: self.password.or_else(|| fallback.password.clone()),
            port: self.port.or(fallback.port),
        }
    }
}

impl std::fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("port", &self.port)
            .finish()
    }
}

/// Validated connection parameters for the users database.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub database: String,
    pub user: String,
    pub password: SecretString,
    pub port: u16,
}

impl ConnectionConfig {
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

impl TryFrom<PartialConfig> for ConnectionConfig {
    type Error = ConfigurationError;

    fn try_from(partial: PartialConfig) -> Result<Self, Self::Error> {
        let host = partial.host.filter(|host| !host.trim().is_empty());
        let user = partial.user.filter(|user| !user.trim().is_empty());
        let password = partial
            .password
            .filter(|password| !password.expose_secret().is_empty());

        let mut missing = Vec::new();
        if host.is_none() {
            missing.push("host");
        }
        if user.is_none() {
            missing.push("user");
        }
        if password.is_none() {
            missing.push("password");
        }

        match (host, user, password) {
            (Some(host), Some(user), Some(password)) => Ok(Self {
                host,
                database: partial
                    .database
                    .filter(|database| !database.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                user,
                password,
                port: partial.port.unwrap_or(DEFAULT_PORT),
            }),
            _ => Err(ConfigurationError::Missing(missing)),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

/// Somewhere connection parameters can be read from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the current parameters. No retries; failures propagate as-is.
    async fn fetch(&self) -> anyhow::Result<PartialConfig>;
}

/// Parameters supplied directly through flags or `SHOPAUTH_DB_*` variables.
#[derive(Clone, Debug)]
pub struct StaticSource {
    config: PartialConfig,
}

impl StaticSource {
    #[must_use]
    pub fn new(config: PartialConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CredentialSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch(&self) -> anyhow::Result<PartialConfig> {
        Ok(self.config.clone())
    }
}

/// Caches the last good [`ConnectionConfig`] from a [`CredentialSource`].
pub struct CredentialStore {
    source: Arc<dyn CredentialSource>,
    cached: RwLock<Option<Arc<ConnectionConfig>>>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(source: Arc<dyn CredentialSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Return the cached config, or fetch and validate a fresh one when the
    /// cache is empty or `force_refresh` is set.
    ///
    /// A failed fetch leaves the previous snapshot in place.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::Fetch`] if the source fails and
    /// [`ConfigurationError::Missing`] if host, user or password are absent.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn get_connection_config(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<ConnectionConfig>, ConfigurationError> {
        if !force_refresh {
            if let Some(config) = self.cached.read().await.as_ref() {
                debug!("using cached connection config");
                return Ok(Arc::clone(config));
            }
        }

        let partial = self
            .source
            .fetch()
            .await
            .map_err(ConfigurationError::Fetch)?;
        let config = Arc::new(ConnectionConfig::try_from(partial)?);

        *self.cached.write().await = Some(Arc::clone(&config));

        info!(
            host = %config.host,
            database = %config.database,
            port = config.port,
            "connection config loaded"
        );

        Ok(config)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}
