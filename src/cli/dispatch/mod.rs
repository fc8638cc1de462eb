//! Maps parsed CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, ARG_PUBLIC_URL, session, upstream};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let public_url = matches
        .get_one::<String>(ARG_PUBLIC_URL)
        .cloned()
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let session_opts = session::Options::parse(matches)?;
    let upstream_opts = upstream::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        public_url,
        session_secret: session_opts.secret,
        session_cookie_name: session_opts.cookie_name,
        session_ttl_seconds: session_opts.ttl_seconds,
        upstream_url: upstream_opts.url,
        upstream_secret_key: upstream_opts.secret_key,
        upstream_timeout_seconds: upstream_opts.timeout_seconds,
    }))
}
