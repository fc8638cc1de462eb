//! Authoritative session check: signature, expiry, and upstream refresh.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, warn};

use super::{
    codec::AdminSession, config::LOGIN_PATH, error::SessionError, gate::redirect,
    store::SessionStore,
};
use crate::upstream::{IdentityProvider, RefreshError};

pub const EXPIRED_LOGIN_PATH: &str = "/admin/login?reason=expired";

/// Outcome of asking the identity provider about a stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Revoked,
    Unavailable,
}

#[derive(Clone)]
pub struct AuthValidator {
    store: SessionStore,
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl AuthValidator {
    #[must_use]
    pub fn new(store: SessionStore, provider: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self {
            store,
            provider,
            timeout,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Decode and verify the request's session cookie.
    ///
    /// # Errors
    /// `Malformed` when the cookie is absent or unparsable, `BadSignature`,
    /// `Expired`, or `InternalFault`.
    pub fn load(&self, headers: &HeaderMap) -> Result<AdminSession, SessionError> {
        let raw = self.store.get(headers).ok_or(SessionError::Malformed)?;
        self.store.codec().decode(&raw)
    }

    /// The verified session, or `None` after logging why it was refused.
    ///
    /// Local checks only: signature and expiry. For collaborators that read
    /// the session outside a protected handler; handlers use [`RequireAdmin`].
    #[must_use]
    pub fn get_session(&self, headers: &HeaderMap) -> Option<AdminSession> {
        self.verified(headers).ok()
    }

    /// Email of the verified session, for callers that need nothing else.
    #[must_use]
    pub fn admin_email(&self, headers: &HeaderMap) -> Option<String> {
        self.get_session(headers).map(|session| session.email)
    }

    fn verified(&self, headers: &HeaderMap) -> Result<AdminSession, SessionError> {
        self.load(headers).inspect_err(|err| {
            log_rejection(err, self.store.get(headers).is_some());
        })
    }

    /// Ask the identity provider whether the stored token is still good.
    ///
    /// A timeout counts as `Unavailable`, never as a revocation.
    #[instrument(skip_all, fields(email = %session.email))]
    pub async fn authoritative_check(&self, session: &AdminSession) -> Verdict {
        match tokio::time::timeout(self.timeout, self.provider.refresh(&session.token)).await {
            Ok(Ok(())) => Verdict::Verified,
            Ok(Err(RefreshError::Unauthorized | RefreshError::Forbidden)) => Verdict::Revoked,
            Ok(Err(RefreshError::Unavailable)) => Verdict::Unavailable,
            Err(_) => {
                warn!("identity provider refresh timed out after {:?}", self.timeout);
                Verdict::Unavailable
            }
        }
    }

    /// Full check for a protected handler.
    ///
    /// # Errors
    /// Returns the [`Rejection`] that must be sent instead of running the handler.
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<AdminSession, Rejection> {
        let had_cookie = self.store.get(headers).is_some();

        let session = match self.verified(headers) {
            Ok(session) => session,
            Err(err) => {
                return Err(match err {
                    SessionError::InternalFault(_) => Rejection::Internal,
                    _ => Rejection::Login {
                        clear_cookie: if had_cookie { self.clear_cookie() } else { None },
                    },
                });
            }
        };

        match self.authoritative_check(&session).await {
            Verdict::Verified => Ok(session),
            Verdict::Revoked => {
                log_rejection(&SessionError::UpstreamRevoked, true);
                Err(Rejection::Expired {
                    clear_cookie: self.clear_cookie(),
                })
            }
            Verdict::Unavailable => {
                log_rejection(&SessionError::UpstreamUnavailable, true);
                Err(Rejection::Unavailable)
            }
        }
    }

    fn clear_cookie(&self) -> Option<HeaderValue> {
        match self.store.clear() {
            Ok(cookie) => Some(cookie),
            Err(err) => {
                error!("Failed to build clear-cookie header: {err}");
                None
            }
        }
    }
}

impl std::fmt::Debug for AuthValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthValidator")
            .field("store", &self.store)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn log_rejection(err: &SessionError, had_cookie: bool) {
    match err {
        SessionError::Malformed if !had_cookie => debug!("no session cookie"),
        SessionError::InternalFault(_) => error!(kind = err.kind(), "session check failed: {err}"),
        SessionError::BadSignature => warn!(kind = err.kind(), "session rejected"),
        _ => info!(kind = err.kind(), "session rejected"),
    }
}

/// Why a protected request did not reach its handler.
#[derive(Debug)]
pub enum Rejection {
    /// Missing or locally invalid session.
    Login { clear_cookie: Option<HeaderValue> },
    /// The provider revoked the token.
    Expired { clear_cookie: Option<HeaderValue> },
    /// Provider outage; the cookie is kept.
    Unavailable,
    Internal,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { clear_cookie } => with_cookie(redirect(LOGIN_PATH), clear_cookie),
            Self::Expired { clear_cookie } => {
                with_cookie(redirect(EXPIRED_LOGIN_PATH), clear_cookie)
            }
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable, please retry",
            )
                .into_response(),
            Self::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

/// Extractor that only yields for an authenticated, upstream-confirmed admin.
///
/// Requires an `Extension<Arc<AuthValidator>>` layer on the router.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminSession);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(validator) = parts.extensions.get::<Arc<AuthValidator>>().cloned() else {
            error!("AuthValidator extension missing from router");
            return Err(Rejection::Internal);
        };
        validator.require_admin(&parts.headers).await.map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{codec::now_millis, config::SessionConfig};
    use crate::upstream::{AuthenticateError, Identity};
    use axum::http::header::{COOKIE, LOCATION};
    use secrecy::SecretString;

    struct StubProvider {
        refresh: Result<(), RefreshError>,
        delay: Duration,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn authenticate(
            &self,
            _email: &str,
            _password: &SecretString,
        ) -> Result<Identity, AuthenticateError> {
            Err(AuthenticateError::Rejected)
        }

        async fn refresh(&self, _token: &str) -> Result<(), RefreshError> {
            tokio::time::sleep(self.delay).await;
            self.refresh
        }
    }

    fn validator(refresh: Result<(), RefreshError>, delay: Duration) -> AuthValidator {
        let config = SessionConfig::new(SecretString::from("validator-secret")).unwrap();
        AuthValidator::new(
            SessionStore::new(&config),
            Arc::new(StubProvider { refresh, delay }),
            Duration::from_millis(50),
        )
    }

    fn session(expires_at: i64) -> AdminSession {
        AdminSession {
            token: "jwt.with.dots".to_string(),
            email: "admin@example.com".to_string(),
            expires_at,
        }
    }

    fn headers_for(validator: &AuthValidator, session: &AdminSession) -> HeaderMap {
        let set_cookie = validator.store().set(session).unwrap();
        let pair = set_cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());
        headers
    }

    fn valid() -> AdminSession {
        session(now_millis() + 60_000)
    }

    #[test]
    fn get_session_verifies() {
        let validator = validator(Ok(()), Duration::ZERO);
        let headers = headers_for(&validator, &valid());
        assert_eq!(validator.get_session(&headers).unwrap().email, "admin@example.com");
        assert_eq!(validator.admin_email(&headers).as_deref(), Some("admin@example.com"));

        assert!(validator.get_session(&HeaderMap::new()).is_none());

        let expired = headers_for(&validator, &session(now_millis() - 1));
        assert_eq!(validator.load(&expired), Err(SessionError::Expired));
        assert!(validator.get_session(&expired).is_none());
    }

    #[tokio::test]
    async fn require_admin_agrees_with_get_session() {
        let validator = validator(Ok(()), Duration::ZERO);
        let live = headers_for(&validator, &valid());
        let expired = headers_for(&validator, &session(now_millis() - 1));
        let mut garbage = HeaderMap::new();
        garbage.insert(COOKIE, HeaderValue::from_static("admin_session=not-a-session"));

        for headers in [live, expired, garbage, HeaderMap::new()] {
            assert_eq!(
                validator.require_admin(&headers).await.ok(),
                validator.get_session(&headers)
            );
        }
    }

    #[test]
    fn load_without_cookie_is_malformed() {
        let validator = validator(Ok(()), Duration::ZERO);
        assert_eq!(validator.load(&HeaderMap::new()), Err(SessionError::Malformed));
    }

    #[tokio::test]
    async fn authoritative_check_verdicts() {
        let s = valid();
        assert_eq!(
            validator(Ok(()), Duration::ZERO).authoritative_check(&s).await,
            Verdict::Verified
        );
        assert_eq!(
            validator(Err(RefreshError::Unauthorized), Duration::ZERO)
                .authoritative_check(&s)
                .await,
            Verdict::Revoked
        );
        assert_eq!(
            validator(Err(RefreshError::Forbidden), Duration::ZERO)
                .authoritative_check(&s)
                .await,
            Verdict::Revoked
        );
        assert_eq!(
            validator(Err(RefreshError::Unavailable), Duration::ZERO)
                .authoritative_check(&s)
                .await,
            Verdict::Unavailable
        );
    }

    #[tokio::test]
    async fn slow_provider_is_unavailable_not_revoked() {
        let validator = validator(Ok(()), Duration::from_secs(5));
        assert_eq!(validator.authoritative_check(&valid()).await, Verdict::Unavailable);
    }

    #[tokio::test]
    async fn require_admin_verified() {
        let validator = validator(Ok(()), Duration::ZERO);
        let s = valid();
        let headers = headers_for(&validator, &s);
        assert_eq!(validator.require_admin(&headers).await.unwrap(), s);
    }

    #[tokio::test]
    async fn require_admin_without_cookie_redirects() {
        let validator = validator(Ok(()), Duration::ZERO);
        let response = validator
            .require_admin(&HeaderMap::new())
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/admin/login");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn require_admin_tampered_clears_and_redirects() {
        let validator = validator(Ok(()), Duration::ZERO);
        let headers = headers_for(&validator, &valid());
        let tampered = headers[COOKIE]
            .to_str()
            .unwrap()
            .replace("admin%40example.com", "mallory%40example.com");
        let mut forged = HeaderMap::new();
        forged.insert(COOKIE, HeaderValue::from_str(&tampered).unwrap());

        let response = validator.require_admin(&forged).await.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/admin/login");
        assert!(response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn require_admin_revoked_redirects_with_reason() {
        let validator = validator(Err(RefreshError::Unauthorized), Duration::ZERO);
        let headers = headers_for(&validator, &valid());
        let response = validator.require_admin(&headers).await.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/admin/login?reason=expired");
        assert!(response.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .starts_with("admin_session=;"));
    }

    #[tokio::test]
    async fn require_admin_outage_keeps_cookie() {
        let validator = validator(Err(RefreshError::Unavailable), Duration::ZERO);
        let headers = headers_for(&validator, &valid());
        let response = validator.require_admin(&headers).await.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert!(response.headers().get(LOCATION).is_none());
    }
}
