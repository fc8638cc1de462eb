use super::handlers::{dashboard, health, login, logout};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login_page,
        login::login,
        logout::logout,
        dashboard::dashboard,
        dashboard::session,
    ),
    components(schemas(login::LoginForm, dashboard::SessionInfo)),
    tags(
        (name = "vigil", description = "Service metadata"),
        (name = "admin", description = "Admin session login, logout and protected pages"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = Some(env!("CARGO_PKG_DESCRIPTION").to_string());
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_admin_routes() {
        let doc = openapi();
        for path in ["/health", "/admin/login", "/admin/logout", "/admin", "/admin/session"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
    }
}
