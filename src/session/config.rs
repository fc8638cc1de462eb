//! Session configuration, built once at startup and shared read-only.

use anyhow::{Result, bail};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

pub const DEFAULT_COOKIE_NAME: &str = "admin_session";
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
pub const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin";
/// `reason` query value carried to the login page after a revocation.
pub const EXPIRED_REASON: &str = "expired";

const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    secret: SecretString,
    cookie_name: String,
    ttl_seconds: i64,
    secure: bool,
}

impl SessionConfig {
    /// Build a config around the signing secret.
    ///
    /// # Errors
    /// Returns an error if the secret is empty. There is no fallback secret.
    pub fn new(secret: SecretString) -> Result<Self> {
        let len = secret.expose_secret().trim().len();
        if len == 0 {
            bail!("session signing secret is not set");
        }
        if len < MIN_RECOMMENDED_SECRET_LEN {
            warn!(
                "session signing secret is shorter than {} bytes",
                MIN_RECOMMENDED_SECRET_LEN
            );
        }

        Ok(Self {
            secret,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            secure: false,
        })
    }

    /// # Errors
    /// Returns an error unless `name` is a non-empty cookie-name token.
    pub fn with_cookie_name(mut self, name: String) -> Result<Self> {
        if !is_cookie_token(&name) {
            bail!("invalid session cookie name {name:?}");
        }
        self.cookie_name = name;
        Ok(self)
    }

    /// # Errors
    /// Returns an error if `seconds` is not positive.
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Result<Self> {
        if seconds <= 0 {
            bail!("session TTL must be positive, got {seconds}");
        }
        self.ttl_seconds = seconds;
        Ok(self)
    }

    /// Mark cookies `Secure` when the dashboard is served over HTTPS.
    #[must_use]
    pub fn with_public_url(mut self, public_url: &str) -> Self {
        self.secure = public_url.starts_with("https://");
        self
    }

    #[must_use]
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.secret
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn ttl_millis(&self) -> i64 {
        self.ttl_seconds.saturating_mul(1000)
    }

    #[must_use]
    pub fn secure(&self) -> bool {
        self.secure
    }
}

// RFC 6265 cookie-name: visible ASCII without separators.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}
