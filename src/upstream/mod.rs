//! Upstream identity provider seam.
//!
//! Credentials are never checked locally: the provider authenticates the
//! admin and later confirms (or refuses) the token stored in the session.

pub mod http;

pub use self::http::HttpIdentityProvider;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

/// Token and canonical email returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub email: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthenticateError {
    #[error("Rejected")]
    Rejected,
    #[error("Unavailable")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Unavailable")]
    Unavailable,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check admin credentials.
    ///
    /// # Errors
    /// `Rejected` when the provider refuses the credentials, `Unavailable` otherwise.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthenticateError>;

    /// Re-validate a stored token.
    ///
    /// # Errors
    /// `Unauthorized`/`Forbidden` when the provider refuses the token,
    /// `Unavailable` for network failures and server errors.
    async fn refresh(&self, token: &str) -> Result<(), RefreshError>;
}
