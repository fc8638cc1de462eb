use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::session::config::{DEFAULT_COOKIE_NAME, DEFAULT_SESSION_TTL_SECONDS};

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long("session-secret")
                .help("Secret used to sign session cookies (32+ bytes recommended)")
                .env("VIGIL_SESSION_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_NAME)
                .long("session-cookie-name")
                .help("Name of the session cookie")
                .env("VIGIL_SESSION_COOKIE_NAME")
                .default_value(DEFAULT_COOKIE_NAME),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("VIGIL_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub secret: SecretString,
    pub cookie_name: String,
    pub ttl_seconds: i64,
}

impl Options {
    /// Parse session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = match matches.get_one::<String>(ARG_SESSION_SECRET).cloned() {
            Some(value) if !value.trim().is_empty() => SecretString::from(value),
            _ => anyhow::bail!("missing required argument: --{ARG_SESSION_SECRET}"),
        };

        let cookie_name = matches
            .get_one::<String>(ARG_SESSION_COOKIE_NAME)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());

        let ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);

        Ok(Self {
            secret,
            cookie_name,
            ttl_seconds,
        })
    }
}
