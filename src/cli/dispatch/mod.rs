//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run. Everything the server needs
//! is resolved here once and passed down; nothing is re-read per request.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{self, database, vault, ARG_BCRYPT_COST, ARG_PORT};
use crate::password::DEFAULT_COST;
use anyhow::{anyhow, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    commands::validate(matches).map_err(|e| anyhow!(e))?;

    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let bcrypt_cost = matches
        .get_one::<u32>(ARG_BCRYPT_COST)
        .copied()
        .unwrap_or(DEFAULT_COST);

    let db = database::Options::parse(matches);
    let vault = if db.use_vault {
        Some(vault::Options::parse(matches).map_err(|e| anyhow!(e))?)
    } else {
        None
    };

    Ok(Action::Server(Args {
        port,
        bcrypt_cost,
        connection: db.connection,
        max_connections: db.max_connections,
        timeout_seconds: db.timeout_seconds,
        refresh_seconds: db.refresh_seconds,
        vault,
    }))
}
