use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::upstream::http::DEFAULT_TIMEOUT_SECONDS;

pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_SECRET_KEY: &str = "upstream-secret-key";
pub const ARG_UPSTREAM_TIMEOUT_SECONDS: &str = "upstream-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .long("upstream-url")
                .help("Base URL of the identity provider")
                .env("VIGIL_UPSTREAM_URL")
                .default_value("http://127.0.0.1:8090"),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_SECRET_KEY)
                .long("upstream-secret-key")
                .help("Shared key sent to the identity provider as x-secret-key")
                .env("VIGIL_UPSTREAM_SECRET_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .long("upstream-timeout-seconds")
                .help("Timeout for identity provider calls in seconds")
                .env("VIGIL_UPSTREAM_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub secret_key: Option<SecretString>,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the upstream URL is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_UPSTREAM_URL).cloned() {
            Some(value) if !value.trim().is_empty() => value,
            _ => anyhow::bail!("missing required argument: --{ARG_UPSTREAM_URL}"),
        };

        let secret_key = matches
            .get_one::<String>(ARG_UPSTREAM_SECRET_KEY)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            url,
            secret_key,
            timeout_seconds: matches
                .get_one::<u64>(ARG_UPSTREAM_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("test"))
    }

    #[test]
    fn defaults() {
        temp_env::with_vars(
            [
                ("VIGIL_UPSTREAM_URL", None::<&str>),
                ("VIGIL_UPSTREAM_SECRET_KEY", None),
                ("VIGIL_UPSTREAM_TIMEOUT_SECONDS", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["test"]);
                let options = Options::parse(&matches).unwrap();
                assert_eq!(options.url, "http://127.0.0.1:8090");
                assert!(options.secret_key.is_none());
                assert_eq!(options.timeout_seconds, 5);
            },
        );
    }

    #[test]
    fn empty_secret_key_is_ignored() {
        temp_env::with_vars([("VIGIL_UPSTREAM_SECRET_KEY", Some(""))], || {
            let matches = command().get_matches_from(vec!["test"]);
            let options = Options::parse(&matches).unwrap();
            assert!(options.secret_key.is_none());
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        temp_env::with_vars([("VIGIL_UPSTREAM_TIMEOUT_SECONDS", None::<&str>)], || {
            let result = command().try_get_matches_from(vec![
                "test",
                "--upstream-timeout-seconds",
                "0",
            ]);
            assert!(result.is_err());
        });
    }
}
