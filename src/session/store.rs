//! Cookie transport for the signed session.

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

use super::{
    codec::{AdminSession, SessionCodec},
    config::SessionConfig,
    error::SessionError,
};

#[derive(Clone, Debug)]
pub struct SessionStore {
    codec: SessionCodec,
    cookie_name: String,
    max_age_seconds: i64,
    secure: bool,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            codec: SessionCodec::new(config),
            cookie_name: config.cookie_name().to_string(),
            max_age_seconds: config.ttl_seconds(),
            secure: config.secure(),
        }
    }

    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Local validity window given to newly issued sessions.
    #[must_use]
    pub fn ttl_millis(&self) -> i64 {
        self.max_age_seconds.saturating_mul(1000)
    }

    /// Encode the session and build the `Set-Cookie` header that stores it.
    ///
    /// # Errors
    /// Returns `SessionError::InternalFault` if encoding fails or the header is invalid.
    pub fn set(&self, session: &AdminSession) -> Result<HeaderValue, SessionError> {
        let value = self.codec.encode(session)?;
        // The JSON payload has quotes and commas, which are not cookie-safe.
        let value = urlencoding::encode(&value);
        self.cookie_header(&value, self.max_age_seconds)
    }

    /// Raw session cookie from the request, without any verification.
    #[must_use]
    pub fn get(&self, headers: &HeaderMap) -> Option<String> {
        for header in headers.get_all(COOKIE) {
            let Ok(value) = header.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                    continue;
                };
                if key.trim() != self.cookie_name {
                    continue;
                }
                let val = val.trim();
                if val.is_empty() {
                    continue;
                }
                return Some(
                    urlencoding::decode(val).map_or_else(|_| val.to_string(), |v| v.into_owned()),
                );
            }
        }
        None
    }

    /// `Set-Cookie` header that deletes the session cookie.
    ///
    /// # Errors
    /// Returns `SessionError::InternalFault` if the header is invalid.
    pub fn clear(&self) -> Result<HeaderValue, SessionError> {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: i64) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|err| SessionError::InternalFault(format!("invalid cookie header: {err}")))
    }
}
