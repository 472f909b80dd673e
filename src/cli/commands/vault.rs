use clap::{Arg, ArgMatches, Command};

pub const ARG_VAULT_URL: &str = "vault-url";
pub const ARG_VAULT_TOKEN: &str = "vault-token";
pub const ARG_VAULT_ROLE_ID: &str = "vault-role-id";
pub const ARG_VAULT_SECRET_ID: &str = "vault-secret-id";
pub const ARG_VAULT_WRAPPED_TOKEN: &str = "vault-wrapped-token";
pub const ARG_VAULT_KV_MOUNT: &str = "vault-kv-mount";
pub const ARG_VAULT_KV_PATH: &str = "vault-kv-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VAULT_URL)
                .long(ARG_VAULT_URL)
                .help("Vault base URL, e.g. https://vault.tld:8200")
                .env("SHOPAUTH_VAULT_URL"),
        )
        .arg(
            Arg::new(ARG_VAULT_TOKEN)
                .long(ARG_VAULT_TOKEN)
                .help("Vault token (skips AppRole login)")
                .env("SHOPAUTH_VAULT_TOKEN")
                .hide_env_values(true)
                .conflicts_with_all([ARG_VAULT_SECRET_ID, ARG_VAULT_WRAPPED_TOKEN]),
        )
        .arg(
            Arg::new(ARG_VAULT_ROLE_ID)
                .long(ARG_VAULT_ROLE_ID)
                .help("Vault AppRole role id")
                .env("SHOPAUTH_VAULT_ROLE_ID"),
        )
        .arg(
            Arg::new(ARG_VAULT_SECRET_ID)
                .long(ARG_VAULT_SECRET_ID)
                .help("Vault AppRole secret id")
                .env("SHOPAUTH_VAULT_SECRET_ID")
                .hide_env_values(true)
                .conflicts_with(ARG_VAULT_WRAPPED_TOKEN),
        )
        .arg(
            Arg::new(ARG_VAULT_WRAPPED_TOKEN)
                .long(ARG_VAULT_WRAPPED_TOKEN)
                .help("Response-wrapped token holding the AppRole secret id")
                .env("SHOPAUTH_VAULT_WRAPPED_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_MOUNT)
                .long(ARG_VAULT_KV_MOUNT)
                .help("Vault KV-v2 mount holding the database secret")
                .env("SHOPAUTH_VAULT_KV_MOUNT")
                .default_value("secret"),
        )
        .arg(
            Arg::new(ARG_VAULT_KV_PATH)
                .long(ARG_VAULT_KV_PATH)
                .help("Vault KV-v2 path of the database secret")
                .env("SHOPAUTH_VAULT_KV_PATH")
                .default_value("shopauth/database"),
        )
}

/// How to obtain a Vault token.
#[derive(PartialEq, Eq)]
pub enum Login {
    Token(String),
    AppRole { role_id: String, secret_id: String },
    Wrapped { role_id: String, wrapped_token: String },
}

impl std::fmt::Debug for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::AppRole { role_id, .. } => f
                .debug_struct("AppRole")
                .field("role_id", role_id)
                .field("secret_id", &"***")
                .finish(),
            Self::Wrapped { role_id, .. } => f
                .debug_struct("Wrapped")
                .field("role_id", role_id)
                .field("wrapped_token", &"***")
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub login: Login,
    pub kv_mount: String,
    pub kv_path: String,
}

impl Options {
    /// Read Vault settings. Only called when credentials come from Vault.
    ///
    /// # Errors
    /// Returns an error naming the missing argument.
    pub fn parse(matches: &ArgMatches) -> Result<Self, String> {
        let get = |id: &str| matches.get_one::<String>(id).cloned();

        let url = get(ARG_VAULT_URL).ok_or_else(|| missing(ARG_VAULT_URL))?;

        let login = if let Some(token) = get(ARG_VAULT_TOKEN) {
            Login::Token(token)
        } else {
            let role_id = get(ARG_VAULT_ROLE_ID).ok_or_else(|| {
                format!("Missing required argument: --{ARG_VAULT_TOKEN} or --{ARG_VAULT_ROLE_ID}")
            })?;
            match (get(ARG_VAULT_SECRET_ID), get(ARG_VAULT_WRAPPED_TOKEN)) {
                (Some(secret_id), _) => Login::AppRole { role_id, secret_id },
                (None, Some(wrapped_token)) => Login::Wrapped {
                    role_id,
                    wrapped_token,
                },
                (None, None) => {
                    return Err(format!(
                        "Missing required argument: --{ARG_VAULT_SECRET_ID} or --{ARG_VAULT_WRAPPED_TOKEN}"
                    ))
                }
            }
        };

        Ok(Self {
            url,
            login,
            kv_mount: get(ARG_VAULT_KV_MOUNT).unwrap_or_else(|| "secret".to_string()),
            kv_path: get(ARG_VAULT_KV_PATH).unwrap_or_else(|| "shopauth/database".to_string()),
        })
    }
}

fn missing(arg: &str) -> String {
    format!("Missing required argument: --{arg} (required when --credentials-source=vault)")
}
