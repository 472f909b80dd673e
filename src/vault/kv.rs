use crate::{
    cli::globals::GlobalArgs,
    credentials::{CredentialSource, PartialConfig},
    vault,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{info_span, instrument, Instrument};

/// Read a KV-v2 secret and return its `data.data` payload.
///
/// # Errors
/// Returns an error if the Vault request fails or the response has no data.
#[instrument(skip(globals))]
pub async fn read_secret(globals: &GlobalArgs, kv_mount: &str, kv_path: &str) -> Result<Value> {
    let path = format!("/v1/{kv_mount}/data/{kv_path}");
    let url = vault::endpoint_url(&globals.vault_url, &path)?;

    let span = info_span!(
        "vault.kv.read",
        http.method = "GET",
        url = %url
    );
    let response = vault::client()?
        .get(&url)
        .header("X-Vault-Token", globals.vault_token.expose_secret())
        .send()
        .instrument(span)
        .await?;

    if !response.status().is_success() {
        return Err(vault::error_from(&url, response).await);
    }

    let mut json: Value = response.json().await?;
    json.get_mut("data")
        .and_then(|data| data.get_mut("data"))
        .map(Value::take)
        .filter(|data| !data.is_null())
        .context("secret data missing from vault response")
}

/// Parse a secret payload into connection fields.
///
/// Accepts a JSON object, or a string holding a JSON object (the format
/// managed secret stores hand out). `database`/`dbname` and `user`/`username`
/// are interchangeable; `port` may be a number or a numeric string.
///
/// # Errors
/// Returns an error if the payload is not an object or a field has the wrong type.
pub fn parse_secret(secret: &Value) -> Result<PartialConfig> {
    let decoded;
    let object = match secret {
        Value::Object(object) => object,
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw).context("secret string is not JSON")?;
            decoded
                .as_object()
                .context("secret string is not a JSON object")?
        }
        _ => return Err(anyhow!("secret must be a JSON object")),
    };

    Ok(PartialConfig {
        host: string_field(object, &["host"])?,
        database: string_field(object, &["database", "dbname"])?,
        user: string_field(object, &["user", "username"])?,
        password: string_field(object, &["password"])?.map(SecretString::from),
        port: port_field(object)?,
    })
}

fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>> {
    for key in keys {
        match object.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(value)) => return Ok(Some(value.clone())),
            Some(_) => return Err(anyhow!("secret field `{key}` must be a string")),
        }
    }
    Ok(None)
}

fn port_field(object: &Map<String, Value>) -> Result<Option<u16>> {
    match object.get("port") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|port| u16::try_from(port).ok())
            .map(Some)
            .context("secret field `port` is out of range"),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<u16>()
            .map(Some)
            .context("secret field `port` is not a valid port"),
        Some(_) => Err(anyhow!("secret field `port` must be a number")),
    }
}

/// Connection parameters stored in a Vault KV-v2 secret. Fields the secret
/// does not carry fall back to the values given on the command line.
#[derive(Debug)]
pub struct VaultSource {
    globals: GlobalArgs,
    kv_mount: String,
    kv_path: String,
    fallback: PartialConfig,
}

impl VaultSource {
    #[must_use]
    pub fn new(globals: GlobalArgs, kv_mount: String, kv_path: String, fallback: PartialConfig) -> Self {
        Self {
            globals,
            kv_mount,
            kv_path,
            fallback,
        }
    }
}

#[async_trait]
impl CredentialSource for VaultSource {
    fn name(&self) -> &'static str {
        "vault"
    }

    async fn fetch(&self) -> Result<PartialConfig> {
        let secret = read_secret(&self.globals, &self.kv_mount, &self.kv_path)
            .await
            .with_context(|| format!("failed to read {}/{}", self.kv_mount, self.kv_path))?;

        Ok(parse_secret(&secret)?.or(&self.fallback))
    }
}
