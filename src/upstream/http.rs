//! HTTP identity provider speaking the PocketBase admin auth API.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::{AuthenticateError, Identity, IdentityProvider, RefreshError};
use crate::APP_USER_AGENT;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

const AUTH_WITH_PASSWORD_PATH: &str = "/api/admins/auth-with-password";
const AUTH_REFRESH_PATH: &str = "/api/admins/auth-refresh";
const SECRET_KEY_HEADER: &str = "x-secret-key";

#[derive(Clone)]
pub struct HttpIdentityProvider {
    base_url: String,
    secret_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpIdentityProvider {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(anyhow!("unsupported upstream URL scheme {scheme}")),
        }
        if url.host().is_none() {
            return Err(anyhow!("Error parsing URL: no host specified"));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    #[must_use]
    pub fn with_secret_key(mut self, secret_key: Option<SecretString>) -> Self {
        self.secret_key = secret_key;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    // A client per call: nothing is shared between concurrent requests.
    fn client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(self.timeout)
            .build()
    }

    fn with_secret_header(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.secret_key {
            Some(key) => request.header(SECRET_KEY_HEADER, key.expose_secret()),
            None => request,
        }
    }
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("base_url", &self.base_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthenticateError> {
        let client = self.client().map_err(|e| {
            error!("Error creating reqwest client: {:?}", e);
            AuthenticateError::Unavailable
        })?;

        let payload = json!({
            "identity": email,
            "password": password.expose_secret(),
        });

        let response = self
            .with_secret_header(client.post(self.endpoint_url(AUTH_WITH_PASSWORD_PATH)))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Error contacting identity provider: {}", e);
                AuthenticateError::Unavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            return if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
                debug!("Identity provider rejected credentials: {}", status);
                Err(AuthenticateError::Rejected)
            } else {
                warn!("Identity provider login failed: {}", status);
                Err(AuthenticateError::Unavailable)
            };
        }

        let body: Value = response.json().await.map_err(|e| {
            error!("Error parsing identity provider response: {}", e);
            AuthenticateError::Unavailable
        })?;

        parse_identity(&body).ok_or_else(|| {
            error!("Identity provider response has no token or email");
            AuthenticateError::Unavailable
        })
    }

    #[instrument(skip_all)]
    async fn refresh(&self, token: &str) -> Result<(), RefreshError> {
        let client = self.client().map_err(|e| {
            error!("Error creating reqwest client: {:?}", e);
            RefreshError::Unavailable
        })?;

        let response = self
            .with_secret_header(client.post(self.endpoint_url(AUTH_REFRESH_PATH)))
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| {
                warn!("Error contacting identity provider: {}", e);
                RefreshError::Unavailable
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(RefreshError::Unauthorized),
            StatusCode::FORBIDDEN => Err(RefreshError::Forbidden),
            status => {
                warn!("Identity provider refresh failed: {}", status);
                Err(RefreshError::Unavailable)
            }
        }
    }
}

fn parse_identity(body: &Value) -> Option<Identity> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())?;
    let email = ["admin", "record"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.get("email")).and_then(Value::as_str))?;

    Some(Identity {
        token: token.to_string(),
        email: email.to_string(),
    })
}
