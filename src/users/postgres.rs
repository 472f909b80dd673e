//! Postgres-backed [`UserStore`].

use super::{StoreError, User, UserStore};
use crate::credentials::ConnectionConfig;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::{future::Future, time::Duration};
use tracing::{info_span, instrument, warn, Instrument};

const FIND_BY_USERNAME: &str = "SELECT id, username, password_hash FROM users WHERE username = $1";

const INSERT_USER: &str = r"
    INSERT INTO users
        (username, password_hash)
    VALUES ($1, $2)
    RETURNING id, username, password_hash
";

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().is_some_and(|code| code.as_ref() == UNIQUE_VIOLATION)
        }
        _ => false,
    }
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    /// Wrap an existing pool. Every store call is bounded by `timeout`.
    #[must_use]
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Build a pool from `config`. Connections are opened lazily, so this
    /// succeeds even while the database is still unreachable.
    #[must_use]
    pub fn connect_lazy(config: &ConnectionConfig, max_connections: u32, timeout: Duration) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .max_lifetime(Duration::from_secs(60 * 30))
            .test_before_acquire(true)
            .connect_lazy_with(config.connect_options());

        Self::new(pool, timeout)
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.bounded(async {
            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "SELECT",
                db.statement = FIND_BY_USERNAME
            );
            let row = sqlx::query(FIND_BY_USERNAME)
                .bind(username)
                .fetch_optional(&self.pool)
                .instrument(span)
                .await?;

            Ok::<_, StoreError>(row.as_ref().map(user_from_row).transpose()?)
        })
        .await
    }

    #[instrument(skip(self, password_hash))]
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        self.bounded(async {
            let mut tx = self.pool.begin().await?;

            let span = info_span!(
                "db.query",
                db.system = "postgresql",
                db.operation = "INSERT",
                db.statement = INSERT_USER
            );
            let row = sqlx::query(INSERT_USER)
                .bind(username)
                .bind(password_hash)
                .fetch_one(&mut *tx)
                .instrument(span)
                .await;

            match row.and_then(|row| user_from_row(&row)) {
                Ok(user) => {
                    tx.commit().await?;
                    Ok(user)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "failed to roll back user insert");
                    }
                    if is_unique_violation(&err) {
                        Err(StoreError::AlreadyExists)
                    } else {
                        Err(err.into())
                    }
                }
            }
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(async {
            let acquire_span = info_span!(
                "db.acquire",
                db.system = "postgresql",
                db.operation = "ACQUIRE"
            );
            let mut conn = self.pool.acquire().instrument(acquire_span).await?;

            let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
            conn.ping().instrument(ping_span).await?;

            Ok::<_, StoreError>(())
        })
        .await
    }
}
