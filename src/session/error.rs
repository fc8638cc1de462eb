use thiserror::Error;

/// Every way a session can fail to authorize a request.
///
/// The first four variants all end the same way for the client (cookie
/// cleared, redirect to login) but are logged separately. The last two never
/// clear the cookie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Cookie absent, missing the separator, or carrying an unparsable payload.
    #[error("malformed session")]
    Malformed,
    /// MAC mismatch: the cookie was altered or signed with another secret.
    #[error("bad session signature")]
    BadSignature,
    /// The embedded `expiresAt` is in the past.
    #[error("session expired")]
    Expired,
    /// The identity provider rejected the stored token (401/403).
    #[error("upstream revoked the session token")]
    UpstreamRevoked,
    /// The identity provider could not be reached or answered with a server error.
    #[error("upstream identity provider unavailable")]
    UpstreamUnavailable,
    #[error("internal session fault: {0}")]
    InternalFault(String),
}

impl SessionError {
    /// Whether this outcome invalidates the local session.
    #[must_use]
    pub const fn clears_session(&self) -> bool {
        matches!(
            self,
            Self::Malformed | Self::BadSignature | Self::Expired | Self::UpstreamRevoked
        )
    }

    /// Stable classification used as the `kind` field in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::UpstreamRevoked => "upstream_revoked",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::InternalFault(_) => "internal_fault",
        }
    }
}
