//! Edge gate: coarse, network-free session check run before routing.
//!
//! The gate only parses the cookie and compares the embedded expiry with the
//! clock. It does not verify the signature; protected handlers do that via
//! [`super::validator::AuthValidator`].

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    codec::{SessionCodec, now_millis},
    config::{ADMIN_PREFIX, DASHBOARD_PATH, EXPIRED_REASON, LOGIN_PATH},
    store::SessionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No cookie, or a cookie whose embedded expiry has passed.
    Unauthenticated,
    /// Parses and is not expired. The signature is still unchecked.
    CoarseValid,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    RedirectToLogin,
    RedirectToDashboard,
    PassThrough,
}

/// Classify a raw cookie without cryptography.
#[must_use]
pub fn quick_check(raw: Option<&str>, now_millis: i64) -> GateState {
    let Some(raw) = raw else {
        return GateState::Unauthenticated;
    };
    match SessionCodec::peek(raw) {
        Ok(session) if session.is_expired_at(now_millis) => GateState::Unauthenticated,
        Ok(_) => GateState::CoarseValid,
        Err(_) => GateState::Malformed,
    }
}

/// Route a request given its coarse session state.
#[must_use]
pub fn decide(uri: &Uri, state: GateState) -> GateDecision {
    let path = normalize(uri.path());
    if !is_admin_path(path) {
        return GateDecision::PassThrough;
    }

    if path == LOGIN_PATH {
        // After a revocation the login page is reached with `reason=expired`;
        // bouncing it back to the dashboard could loop on a stale cookie.
        if state == GateState::CoarseValid && !is_expired_notice(uri) {
            return GateDecision::RedirectToDashboard;
        }
        return GateDecision::PassThrough;
    }

    match state {
        GateState::CoarseValid => GateDecision::PassThrough,
        GateState::Unauthenticated | GateState::Malformed => GateDecision::RedirectToLogin,
    }
}

#[derive(Clone, Debug)]
pub struct EdgeGate {
    store: SessionStore,
}

impl EdgeGate {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn evaluate(&self, request: &Request<Body>, now_millis: i64) -> GateDecision {
        let raw = self.store.get(request.headers());
        let state = quick_check(raw.as_deref(), now_millis);
        let decision = decide(request.uri(), state);
        debug!(path = %request.uri().path(), ?state, ?decision, "edge gate");
        decision
    }
}

/// axum middleware wrapping [`EdgeGate::evaluate`].
pub async fn edge_gate(
    State(gate): State<Arc<EdgeGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate.evaluate(&request, now_millis()) {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::RedirectToLogin => redirect(LOGIN_PATH),
        GateDecision::RedirectToDashboard => redirect(DASHBOARD_PATH),
    }
}

pub(crate) fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn is_admin_path(path: &str) -> bool {
    path == ADMIN_PREFIX
        || path
            .strip_prefix(ADMIN_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_expired_notice(uri: &Uri) -> bool {
    uri.query().is_some_and(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "reason" && value == EXPIRED_REASON)
    })
}
