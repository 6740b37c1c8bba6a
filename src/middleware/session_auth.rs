//! Session-based authentication middleware.
//!
//! Validates the session cookie for every protected route.
//!
//! # Session Flow
//!
//! 1. User registers or logs in with username + password
//! 2. Server creates a session row and sets the `sid` cookie
//! 3. Subsequent requests include the cookie, validated by this middleware
//! 4. Each validated request slides the expiry forward; logout deletes
//!    the session server-side
//!
//! # Security Model
//!
//! - Session IDs are cryptographically random (nanoid)
//! - Sessions are stored server-side in the database
//! - Cookie is HttpOnly, Secure (when served over https), SameSite=Lax
//! - Sessions can be invalidated server-side (logout, deleted user)

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::config::config;
use crate::db::{self, PublicUser};
use crate::{AppState, Error};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sid";

/// Middleware that requires a valid session.
///
/// Extracts the session ID from the cookie, validates it against the
/// database, touches the session, and injects the caller's `PublicUser`
/// profile into request extensions.
///
/// # Errors
///
/// Returns 401 Unauthorized when:
/// - No session cookie is present ("Authentication required")
/// - The session is unknown or expired ("Session expired")
/// - The session's user no longer exists ("User no longer exists")
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    // Extract session ID from cookie
    let session_id = jar
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or(Error::AuthRequired)?;

    // Validate session and get the caller's profile
    let user = validate_session(&state, &session_id).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Validate a session ID and return the owning user's public profile.
async fn validate_session(state: &AppState, session_id: &str) -> Result<PublicUser, Error> {
    let session = db::get_session(&state.db, session_id)
        .await?
        .ok_or(Error::SessionExpired)?;

    // Expired rows are deleted on sight
    if session.is_expired() {
        db::delete_session(&state.db, &session.id).await?;
        return Err(Error::SessionExpired);
    }

    let user = match db::get_user(&state.db, &session.user_id).await? {
        Some(user) => user,
        None => {
            // Dangling session for a deleted account
            db::delete_session(&state.db, &session.id).await?;
            return Err(Error::UserGone);
        }
    };

    // Slide the expiry forward on every authenticated request
    let max_age = chrono::Duration::seconds(config().session.max_age_seconds as i64);
    db::touch_session(&state.db, &session.id, chrono::Utc::now() + max_age).await?;

    Ok(user.public())
}
