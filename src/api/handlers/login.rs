//! Admin login: credential check delegated to the identity provider.

use axum::{
    extract::{Extension, Form, Query},
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{Html, IntoResponse, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use super::{escape_html, page, valid_email};
use crate::session::{
    AdminSession, AuthValidator,
    codec::now_millis,
    config::{DASHBOARD_PATH, EXPIRED_REASON, LOGIN_PATH},
};
use crate::upstream::AuthenticateError;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const PROVIDER_UNAVAILABLE: &str = "Authentication service unavailable, please try again";
pub const SESSION_EXPIRED: &str = "Your session has expired, please sign in again";

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Set to `expired` after the identity provider revoked the session.
    reason: Option<String>,
}

#[utoipa::path(
    get,
    path = "/admin/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login form", content_type = "text/html"),
        (status = 302, description = "Already signed in, redirect to the dashboard"),
    ),
    tag = "admin"
)]
pub async fn login_page(query: Option<Query<LoginQuery>>) -> Html<String> {
    let notice = query
        .and_then(|Query(query)| query.reason)
        .filter(|reason| reason == EXPIRED_REASON)
        .map(|_| SESSION_EXPIRED);
    Html(login_form(None, notice, ""))
}

#[utoipa::path(
    post,
    path = "/admin/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, session cookie set"),
        (status = 400, description = "Invalid email or missing password", content_type = "text/html"),
        (status = 401, description = "Invalid email or password", content_type = "text/html"),
        (status = 503, description = "Identity provider unavailable", content_type = "text/html"),
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn login(
    validator: Extension<Arc<AuthValidator>>,
    payload: Option<Form<LoginForm>>,
) -> Response {
    let LoginForm { email, password } = match payload {
        Some(Form(payload)) => payload,
        None => return form_error(StatusCode::BAD_REQUEST, INVALID_EMAIL, ""),
    };

    let email = email.trim().to_string();
    if !valid_email(&email) {
        return form_error(StatusCode::BAD_REQUEST, INVALID_EMAIL, &email);
    }
    if password.is_empty() {
        return form_error(StatusCode::BAD_REQUEST, PASSWORD_REQUIRED, &email);
    }
    let password = SecretString::from(password);

    let identity = match validator.provider().authenticate(&email, &password).await {
        Ok(identity) => identity,
        Err(AuthenticateError::Rejected) => {
            warn!("admin login rejected");
            return form_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS, &email);
        }
        Err(AuthenticateError::Unavailable) => {
            return form_error(StatusCode::SERVICE_UNAVAILABLE, PROVIDER_UNAVAILABLE, &email);
        }
    };

    let session = AdminSession::issue(
        identity.token,
        identity.email,
        now_millis(),
        validator.store().ttl_millis(),
    );

    match validator.store().set(&session) {
        Ok(cookie) => {
            info!(email = %session.email, "admin signed in");
            (
                StatusCode::SEE_OTHER,
                [(LOCATION, DASHBOARD_PATH.to_string())],
                [(SET_COOKIE, cookie)],
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to issue session cookie: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn form_error(status: StatusCode, message: &str, email: &str) -> Response {
    (status, Html(login_form(Some(message), None, email))).into_response()
}

fn login_form(error: Option<&str>, notice: Option<&str>, email: &str) -> String {
    let mut body = String::from("<main>\n<h1>Admin Login</h1>\n<p>Sign in to access the admin dashboard</p>\n");
    if let Some(notice) = notice {
        body.push_str(&format!("<p class=\"notice\">{}</p>\n", escape_html(notice)));
    }
    if let Some(error) = error {
        body.push_str(&format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape_html(error)));
    }
    body.push_str(&format!(
        "<form method=\"post\" action=\"{LOGIN_PATH}\">\n\
         <input type=\"email\" name=\"email\" value=\"{}\" placeholder=\"Email address\" autocomplete=\"email\" required>\n\
         <input type=\"password\" name=\"password\" placeholder=\"Password\" autocomplete=\"current-password\" required>\n\
         <button type=\"submit\">Sign in</button>\n\
         </form>\n</main>",
        escape_html(email)
    ));
    page("Admin Login", &body)
}
