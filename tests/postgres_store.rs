//! Postgres integration tests. Skipped when no container runtime is reachable.

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use shopauth::{
    auth::{AuthError, SigninService, SignupService},
    credentials::{CredentialStore, PartialConfig, StaticSource},
    password::PasswordHasher,
    users::{postgres::PgUserStore, StoreError, UserStore},
};
use sqlx::{Connection, PgConnection};
use std::{env, path::Path, sync::Arc, time::Duration};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const POSTGRES_PORT: u16 = 5432;
const POSTGRES_PASSWORD: &str = "postgres";

fn ensure_container_runtime() -> Result<()> {
    if let Ok(docker_host) = env::var("DOCKER_HOST") {
        match docker_host.strip_prefix("unix://") {
            Some(path) if !Path::new(path).exists() => {
                bail!("`DOCKER_HOST` points to `{docker_host}`, but the socket does not exist")
            }
            _ => return Ok(()),
        }
    }

    if Path::new("/var/run/docker.sock").exists() {
        return Ok(());
    }

    bail!("No container runtime socket found. Start the Docker daemon or set `DOCKER_HOST`.")
}

struct TestDb {
    _container: ContainerAsync<GenericImage>,
    credentials: Arc<CredentialStore>,
    store: Arc<PgUserStore>,
}

impl TestDb {
    async fn new() -> Result<Self> {
        if let Err(err) = ensure_container_runtime() {
            eprintln!("Skipping integration test: {err}");
            return Err(err);
        }

        let container = GenericImage::new("postgres", "17-alpine")
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .start()
            .await
            .context("Failed to start Postgres container")?;
        let host_port = container
            .get_host_port_ipv4(POSTGRES_PORT.tcp())
            .await
            .context("Failed to resolve Postgres host port")?;

        let credentials = Arc::new(CredentialStore::new(Arc::new(StaticSource::new(
            PartialConfig {
                host: Some("127.0.0.1".to_string()),
                user: Some("postgres".to_string()),
                password: Some(SecretString::from(POSTGRES_PASSWORD)),
                port: Some(host_port),
                database: None,
            },
        ))));
        let config = credentials.get_connection_config(false).await?;

        apply_schema(&config.connect_options()).await?;

        let store = PgUserStore::connect_lazy(&config, 10, Duration::from_secs(5));

        Ok(Self {
            _container: container,
            credentials,
            store: Arc::new(store),
        })
    }

    fn services(&self) -> Result<(SignupService, SigninService)> {
        let hasher = PasswordHasher::new(4)?;
        Ok((
            SignupService::new(self.store.clone(), hasher.clone()),
            SigninService::new(self.store.clone(), hasher),
        ))
    }
}

async fn apply_schema(options: &sqlx::postgres::PgConnectOptions) -> Result<()> {
    // The ready message is printed once during initdb too; retry until the
    // final server accepts connections.
    let mut attempts = 0;
    let mut connection = loop {
        match PgConnection::connect_with(options).await {
            Ok(connection) => break connection,
            Err(err) if attempts < 20 => {
                attempts += 1;
                eprintln!("waiting for postgres: {err}");
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            Err(err) => return Err(err).context("failed to connect to postgres"),
        }
    };

    sqlx::raw_sql(SCHEMA_SQL)
        .execute(&mut connection)
        .await
        .context("failed to apply schema")?;
    Ok(())
}

#[tokio::test]
async fn register_then_authenticate() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (signup, signin) = db.services()?;

    let registered = signup.register("alice", "secret1").await?;
    let authenticated = signin.authenticate("alice", "secret1").await?;
    assert_eq!(registered.id, authenticated.id);

    let stored = db
        .store
        .find_by_username("alice")
        .await?
        .context("user should exist")?;
    assert!(stored.password_hash.starts_with("$2"));
    assert_ne!(stored.password_hash, "secret1");

    assert!(matches!(
        signin.authenticate("alice", "wrong-password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        signin.authenticate("ALICE", "secret1").await,
        Err(AuthError::InvalidCredentials)
    ));
    Ok(())
}

#[tokio::test]
async fn duplicate_insert_is_already_exists() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    db.store.insert_user("bob", "$2b$04$digest").await?;
    let result = db.store.insert_user("bob", "$2b$04$other").await;
    assert!(matches!(result, Err(StoreError::AlreadyExists)));

    // The failed transaction must not poison the pool.
    db.store.insert_user("carol", "$2b$04$digest").await?;
    db.store.ping().await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_signups_yield_one_account() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };
    let (signup, _) = db.services()?;
    let signup = Arc::new(signup);

    let attempts = (0..8).map(|_| {
        let signup = signup.clone();
        tokio::spawn(async move { signup.register("dave", "secret1").await })
    });

    let mut created = 0;
    let mut conflicts = 0;
    for handle in attempts.collect::<Vec<_>>() {
        match handle.await? {
            Ok(_) => created += 1,
            Err(AuthError::AlreadyExists) => conflicts += 1,
            Err(err) => bail!("unexpected error: {err}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    Ok(())
}

#[tokio::test]
async fn forced_refresh_reuses_static_credentials() -> Result<()> {
    let Ok(db) = TestDb::new().await else {
        return Ok(());
    };

    let cached = db.credentials.get_connection_config(false).await?;
    let refreshed = db.credentials.get_connection_config(true).await?;
    assert!(!Arc::ptr_eq(&cached, &refreshed));
    assert_eq!(cached.port, refreshed.port);

    db.store.pool().set_connect_options(refreshed.connect_options());
    db.store.ping().await?;
    Ok(())
}
