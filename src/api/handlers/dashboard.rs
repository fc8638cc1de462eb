//! Protected admin pages. Each handler takes [`RequireAdmin`], so its body
//! only runs for a verified, upstream-confirmed session.

use axum::response::{Html, Json};
use serde::Serialize;
use utoipa::ToSchema;

use super::{escape_html, page};
use crate::session::RequireAdmin;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub email: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin dashboard", content_type = "text/html"),
        (status = 302, description = "Not signed in, or the session was revoked"),
        (status = 503, description = "Identity provider unavailable"),
    ),
    tag = "admin"
)]
pub async fn dashboard(RequireAdmin(session): RequireAdmin) -> Html<String> {
    let body = format!(
        "<header>\n<h1>Admin Dashboard</h1>\n<span class=\"email\">{}</span>\n\
         <form method=\"post\" action=\"/admin/logout\"><button type=\"submit\">Logout</button></form>\n\
         </header>",
        escape_html(&session.email)
    );
    Html(page("Admin Dashboard", &body))
}

#[utoipa::path(
    get,
    path = "/admin/session",
    responses(
        (status = 200, description = "Current admin session", body = SessionInfo),
        (status = 302, description = "Not signed in, or the session was revoked"),
        (status = 503, description = "Identity provider unavailable"),
    ),
    tag = "admin"
)]
pub async fn session(RequireAdmin(session): RequireAdmin) -> Json<SessionInfo> {
    Json(SessionInfo {
        email: session.email,
        expires_at: session.expires_at,
    })
}
