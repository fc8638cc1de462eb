use axum::{
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::session::{AuthValidator, config::LOGIN_PATH};

#[utoipa::path(
    post,
    path = "/admin/logout",
    responses(
        (status = 303, description = "Session cleared, redirect to login")
    ),
    tag = "admin"
)]
pub async fn logout(validator: Extension<Arc<AuthValidator>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_static(LOGIN_PATH));

    // Always clear the cookie, even if the session was already invalid.
    match validator.store().clear() {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build clear-cookie header: {err}"),
    }
    info!("admin signed out");

    (StatusCode::SEE_OTHER, headers)
}
