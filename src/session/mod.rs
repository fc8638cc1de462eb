//! Signed-cookie admin sessions.
//!
//! - [`codec`] signs and verifies the cookie value.
//! - [`store`] moves it in and out of HTTP headers.
//! - [`gate`] is the coarse pre-routing check.
//! - [`validator`] is the authoritative check used by protected handlers.

pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod store;
pub mod validator;

pub use self::codec::{AdminSession, SessionCodec};
pub use self::config::SessionConfig;
pub use self::error::SessionError;
pub use self::gate::{EdgeGate, GateDecision, GateState};
pub use self::store::SessionStore;
pub use self::validator::{AuthValidator, Rejection, RequireAdmin, Verdict};
