use crate::{
    api,
    cli::{
        commands::vault::{Login, Options as VaultOptions},
        globals::GlobalArgs,
    },
    credentials::{refresh, CredentialSource, CredentialStore, PartialConfig, StaticSource},
    password::PasswordHasher,
    users::postgres::PgUserStore,
    vault,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub bcrypt_cost: u32,
    pub connection: PartialConfig,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    pub refresh_seconds: u64,
    pub vault: Option<VaultOptions>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if Vault login fails, database credentials are incomplete, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let source: Arc<dyn CredentialSource> = match args.vault {
        Some(options) => {
            let globals = vault_login(&options).await?;
            debug!("Global args: {:?}", globals);
            Arc::new(vault::kv::VaultSource::new(
                globals,
                options.kv_mount,
                options.kv_path,
                args.connection,
            ))
        }
        None => Arc::new(StaticSource::new(args.connection)),
    };

    let credentials = Arc::new(CredentialStore::new(source));

    // Incomplete credentials abort startup.
    let config = credentials
        .get_connection_config(false)
        .await
        .context("Could not resolve database connection settings")?;

    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        "database configured"
    );

    let timeout = Duration::from_secs(args.timeout_seconds);
    let store = PgUserStore::connect_lazy(&config, args.max_connections, timeout);

    if args.refresh_seconds > 0 {
        refresh::spawn_rotation(
            credentials.clone(),
            store.pool().clone(),
            Duration::from_secs(args.refresh_seconds),
        );
    }

    let hasher = PasswordHasher::new(args.bcrypt_cost)
        .context("Failed to initialize password hasher")?;

    info!(bcrypt_cost = hasher.cost(), "password hasher ready");

    api::new(args.port, Arc::new(store), hasher).await
}

async fn vault_login(options: &VaultOptions) -> Result<GlobalArgs> {
    let mut globals = GlobalArgs::new(options.url.clone());

    let token = match &options.login {
        Login::Token(token) => token.clone(),
        Login::AppRole { role_id, secret_id } => {
            let (token, _) = vault::approle_login(&globals.vault_url, secret_id, role_id).await?;
            token
        }
        Login::Wrapped {
            role_id,
            wrapped_token,
        } => {
            let secret_id = vault::unwrap(&globals.vault_url, wrapped_token).await?;
            let (token, _) = vault::approle_login(&globals.vault_url, &secret_id, role_id).await?;
            token
        }
    };

    globals.set_token(SecretString::from(token));

    Ok(globals)
}
