//! Cookie payload serialization and HMAC-SHA256 signing.
//!
//! Wire format: `<json-payload>.<hex-hmac-sha256>`. The upstream token is
//! usually a JWT and contains dots itself, so the separator is always the
//! **last** `.` in the value.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use super::{config::SessionConfig, error::SessionError};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEX_LEN: usize = 64;

/// The signed session carried by the admin cookie.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

impl AdminSession {
    /// Create a session that expires `ttl_millis` after `now_millis`.
    #[must_use]
    pub fn issue(token: String, email: String, now_millis: i64, ttl_millis: i64) -> Self {
        Self {
            token,
            email,
            expires_at: now_millis.saturating_add(ttl_millis),
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at <= now_millis
    }
}

impl fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSession")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct SessionCodec {
    key: SecretString,
}

impl SessionCodec {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            key: config.secret().clone(),
        }
    }

    /// Serialize and sign a session into a cookie value.
    ///
    /// # Errors
    /// Returns `SessionError::InternalFault` if serialization or key setup fails.
    pub fn encode(&self, session: &AdminSession) -> Result<String, SessionError> {
        let payload = serde_json::to_string(session)
            .map_err(|err| SessionError::InternalFault(format!("serialize session: {err}")))?;
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify and decode a cookie value against the current clock.
    ///
    /// # Errors
    /// `Malformed`, `BadSignature` or `Expired` for invalid input,
    /// `InternalFault` only if the signing key cannot be used.
    pub fn decode(&self, raw: &str) -> Result<AdminSession, SessionError> {
        self.decode_at(raw, now_millis())
    }

    /// Same as [`SessionCodec::decode`] with an explicit clock.
    ///
    /// # Errors
    /// See [`SessionCodec::decode`].
    pub fn decode_at(&self, raw: &str, now_millis: i64) -> Result<AdminSession, SessionError> {
        let (payload, signature) = split_cookie(raw).ok_or(SessionError::Malformed)?;
        self.verify(payload, signature)?;

        let session = parse_payload(payload)?;
        if session.is_expired_at(now_millis) {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    /// Structural parse without signature verification or expiry check.
    ///
    /// Shared by the edge gate, which must stay free of cryptography.
    ///
    /// # Errors
    /// Returns `SessionError::Malformed` when the value cannot be parsed.
    pub fn peek(raw: &str) -> Result<AdminSession, SessionError> {
        let (payload, _) = split_cookie(raw).ok_or(SessionError::Malformed)?;
        parse_payload(payload)
    }

    fn verify(&self, payload: &str, signature: &str) -> Result<(), SessionError> {
        // Only canonical lowercase hex is accepted, so every altered character
        // of the signature changes the decoded bytes.
        if signature.len() != SIGNATURE_HEX_LEN
            || !signature
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(SessionError::BadSignature);
        }
        let provided = hex::decode(signature).map_err(|_| SessionError::BadSignature)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&provided)
            .map_err(|_| SessionError::BadSignature)
    }

    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|err| SessionError::InternalFault(format!("invalid signing key: {err}")))
    }
}

impl fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

fn split_cookie(raw: &str) -> Option<(&str, &str)> {
    raw.rsplit_once('.')
}

fn parse_payload(payload: &str) -> Result<AdminSession, SessionError> {
    let session: AdminSession =
        serde_json::from_str(payload).map_err(|_| SessionError::Malformed)?;
    if session.token.is_empty() {
        return Err(SessionError::Malformed);
    }
    Ok(session)
}
