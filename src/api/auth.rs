//! Authentication routes.
//!
//! Routes:
//! - POST /auth/register - Create an account and start a session
//! - POST /auth/login - Start a session
//! - POST /auth/logout - End the current session
//! - GET /me - Current user profile (session required)

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::Value;

use super::{ApiJson, Envelope};
use crate::config::config;
use crate::db::{self, PublicUser};
use crate::middleware::{require_session, SESSION_COOKIE_NAME};
use crate::services;
use crate::{AppState, Error, Result};

/// Build authentication routes.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route(
            "/me",
            get(current_user).layer(middleware::from_fn_with_state(state, require_session)),
        )
}

#[derive(Debug)]
struct Credentials {
    username: String,
    password: String,
}

/// The username is trimmed, the password kept verbatim. Non-string
/// values count as missing.
fn normalize_credentials(body: &Value) -> Result<Credentials> {
    let username = body
        .get("username")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    if username.is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "Username and password required".to_string(),
        ));
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    success: bool,
}

/// Register a new account.
///
/// POST /auth/register
#[axum::debug_handler]
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, CookieJar, Json<Envelope<PublicUser>>)> {
    let credentials = normalize_credentials(&body)?;

    // Checked up front for the friendly error; the unique index still
    // catches concurrent registrations.
    if db::get_user_by_username(&state.db, &credentials.username)
        .await?
        .is_some()
    {
        return Err(Error::AlreadyExists("Username already exists".to_string()));
    }

    let password_hash = services::hash_password(&credentials.password)?;
    let user = db::create_user(
        &state.db,
        db::CreateUser {
            username: credentials.username,
            password_hash,
        },
    )
    .await?;

    tracing::info!("Registered user {}", user.username);

    let jar = start_session(&state, jar, &user.id).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(Envelope::data(user.public())),
    ))
}

/// Log in with username and password.
///
/// POST /auth/login
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<Value>,
) -> Result<(CookieJar, Json<Envelope<PublicUser>>)> {
    let credentials = normalize_credentials(&body)?;

    // Unknown user and wrong password answer identically
    let user = db::get_user_by_username(&state.db, &credentials.username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !services::verify_password(&credentials.password, &user.password_hash)? {
        return Err(Error::InvalidCredentials);
    }

    let jar = start_session(&state, jar, &user.id).await?;

    Ok((jar, Json(Envelope::data(user.public()))))
}

/// Log out the current session, if any.
///
/// POST /auth/logout
#[axum::debug_handler]
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Envelope<LogoutResponse>>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        db::delete_session(&state.db, cookie.value()).await?;
    }

    let jar = jar.add(expired_session_cookie());

    Ok((jar, Json(Envelope::data(LogoutResponse { success: true }))))
}

/// Return the authenticated user's profile.
///
/// GET /me
#[axum::debug_handler]
async fn current_user(Extension(user): Extension<PublicUser>) -> Json<Envelope<PublicUser>> {
    Json(Envelope::data(user))
}

/// Create a session row and attach its cookie to the jar.
async fn start_session(state: &AppState, jar: CookieJar, user_id: &str) -> Result<CookieJar> {
    let config = config();
    let max_age = config.session.max_age_seconds as i64;

    let session = db::create_session(
        &state.db,
        db::CreateSession {
            id: nanoid::nanoid!(32),
            user_id: user_id.to_string(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(max_age),
        },
    )
    .await?;

    let cookie = Cookie::build((SESSION_COOKIE_NAME, session.id))
        .path("/")
        .http_only(true)
        .secure(config.server.public_url.starts_with("https"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build();

    Ok(jar.add(cookie))
}

/// An immediately-expiring cookie that overwrites the session cookie.
fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(0))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_trim_username_only() {
        let credentials =
            normalize_credentials(&json!({"username": "  alice  ", "password": "  pw  "}))
                .unwrap();
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, "  pw  ");
    }

    #[test]
    fn test_credentials_missing_fields() {
        for body in [
            json!({}),
            json!({"username": "alice"}),
            json!({"password": "pw"}),
            json!({"username": "   ", "password": "pw"}),
            json!({"username": 42, "password": "pw"}),
            json!({"username": "alice", "password": ""}),
        ] {
            let err = normalize_credentials(&body).unwrap_err();
            assert_eq!(err.to_string(), "Username and password required");
        }
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let cookie = expired_session_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(0)));
    }
}
