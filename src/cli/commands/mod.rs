pub mod database;
pub mod logging;
pub mod vault;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";

/// Validate that Vault settings are complete when Vault is the credential source.
///
/// # Errors
/// Returns an error string naming the missing argument.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    if database::Options::parse(matches).use_vault {
        vault::Options::parse(matches)?;
    }
    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("shopauth")
        .about("User registration and sign-in")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("SHOPAUTH_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor for new password digests")
                .default_value("10")
                .env("SHOPAUTH_BCRYPT_COST")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        );

    let command = database::with_args(command);
    let command = vault::with_args(command);
    logging::with_args(command)
}
