//! Middleware for Hearth.
//!
//! - `session_auth` - Session/cookie validation for all protected routes

mod session_auth;

pub use session_auth::{require_session, SESSION_COOKIE_NAME};
