//! # Vigil (admin session gate)
//!
//! `vigil` protects a single-operator admin dashboard with a signed session
//! cookie. The cookie is the only session state: there is no server-side
//! session table.
//!
//! ## Two tiers
//!
//! - **Edge gate:** runs before routing, parses the cookie structurally and
//!   checks its embedded expiry. It never verifies the signature and never
//!   touches the network.
//! - **Authoritative check:** protected handlers verify the HMAC-SHA256
//!   signature and ask the upstream identity provider to refresh the stored
//!   token, which catches revocation that happened outside this service.
//!
//! Invalid, tampered, expired, and revoked sessions all clear the cookie and
//! redirect to the login page. An unreachable provider never logs the admin
//! out; it surfaces as a transient error instead.

pub mod api;
pub mod cli;
pub mod session;
pub mod upstream;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
