use crate::{
    api,
    session::{AuthValidator, SessionConfig, SessionStore},
    upstream::HttpIdentityProvider,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub public_url: String,
    pub session_secret: SecretString,
    pub session_cookie_name: String,
    pub session_ttl_seconds: i64,
    pub upstream_url: String,
    pub upstream_secret_key: Option<SecretString>,
    pub upstream_timeout_seconds: u64,
}

/// Build the session components and start the server.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = SessionConfig::new(args.session_secret)
        .context("invalid VIGIL_SESSION_SECRET")?
        .with_cookie_name(args.session_cookie_name)
        .context("invalid VIGIL_SESSION_COOKIE_NAME")?
        .with_ttl_seconds(args.session_ttl_seconds)
        .context("invalid VIGIL_SESSION_TTL_SECONDS")?
        .with_public_url(&args.public_url);

    debug!(
        cookie = config.cookie_name(),
        ttl_seconds = config.ttl_seconds(),
        secure = config.secure(),
        "session config"
    );

    let timeout = Duration::from_secs(args.upstream_timeout_seconds);
    let provider = HttpIdentityProvider::new(&args.upstream_url)
        .context("invalid VIGIL_UPSTREAM_URL")?
        .with_secret_key(args.upstream_secret_key)
        .with_timeout(timeout);

    info!("Identity provider: {}", args.upstream_url);

    let validator = Arc::new(AuthValidator::new(
        SessionStore::new(&config),
        Arc::new(provider),
        timeout,
    ));

    api::new(args.port, validator).await
}
