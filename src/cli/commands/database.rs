use crate::credentials::PartialConfig;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_CREDENTIALS_SOURCE: &str = "credentials-source";
pub const ARG_DB_HOST: &str = "db-host";
pub const ARG_DB_PORT: &str = "db-port";
pub const ARG_DB_NAME: &str = "db-name";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";
pub const ARG_DB_TIMEOUT_SECONDS: &str = "db-timeout-seconds";
pub const ARG_DB_REFRESH_SECONDS: &str = "db-credentials-refresh-seconds";

pub const SOURCE_ENV: &str = "env";
pub const SOURCE_VAULT: &str = "vault";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CREDENTIALS_SOURCE)
                .long(ARG_CREDENTIALS_SOURCE)
                .help("Where database credentials come from")
                .env("SHOPAUTH_CREDENTIALS_SOURCE")
                .value_parser([SOURCE_ENV, SOURCE_VAULT])
                .default_value(SOURCE_ENV),
        )
        .arg(
            Arg::new(ARG_DB_HOST)
                .long(ARG_DB_HOST)
                .help("Database host")
                .env("SHOPAUTH_DB_HOST"),
        )
        .arg(
            Arg::new(ARG_DB_PORT)
                .long(ARG_DB_PORT)
                .help("Database port [default: 5432]")
                .env("SHOPAUTH_DB_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DB_NAME)
                .long(ARG_DB_NAME)
                .help("Database name [default: postgres]")
                .env("SHOPAUTH_DB_NAME"),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("Database user")
                .env("SHOPAUTH_DB_USER"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("Database password")
                .env("SHOPAUTH_DB_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long(ARG_DB_MAX_CONNECTIONS)
                .help("Maximum number of pooled database connections")
                .env("SHOPAUTH_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_DB_TIMEOUT_SECONDS)
                .long(ARG_DB_TIMEOUT_SECONDS)
                .help("Upper bound for a single database operation")
                .env("SHOPAUTH_DB_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_DB_REFRESH_SECONDS)
                .long(ARG_DB_REFRESH_SECONDS)
                .help("Re-read database credentials every N seconds (0 disables)")
                .env("SHOPAUTH_DB_CREDENTIALS_REFRESH_SECONDS")
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub use_vault: bool,
    pub connection: PartialConfig,
    pub max_connections: u32,
    pub timeout_seconds: u64,
    pub refresh_seconds: u64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let use_vault = matches
            .get_one::<String>(ARG_CREDENTIALS_SOURCE)
            .is_some_and(|source| source == SOURCE_VAULT);

        let connection = PartialConfig {
            host: matches.get_one::<String>(ARG_DB_HOST).cloned(),
            database: matches.get_one::<String>(ARG_DB_NAME).cloned(),
            user: matches.get_one::<String>(ARG_DB_USER).cloned(),
            password: matches
                .get_one::<String>(ARG_DB_PASSWORD)
                .map(|password| SecretString::from(password.clone())),
            port: matches.get_one::<u16>(ARG_DB_PORT).copied(),
        };

        Self {
            use_vault,
            connection,
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(5),
            timeout_seconds: matches
                .get_one::<u64>(ARG_DB_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(5),
            refresh_seconds: matches
                .get_one::<u64>(ARG_DB_REFRESH_SECONDS)
                .copied()
                .unwrap_or(0),
        }
    }
}
