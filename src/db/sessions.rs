//! Web session queries.
//!
//! Sessions carry a sliding expiry: every authenticated request calls
//! `touch_session`, which refreshes updated_at and pushes expires_at out
//! by the configured max age. Expired rows are deleted on sight by the
//! auth middleware and swept once at startup.

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use super::{now_iso, DbPool};

// ============================================================================
// Types
// ============================================================================

/// Web session record.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub expires_at: String,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        if let Ok(expires) = DateTime::parse_from_rfc3339(&self.expires_at) {
            expires < Utc::now()
        } else {
            true // If we can't parse, treat as expired
        }
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

fn format_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Queries
// ============================================================================

/// Insert a new session.
pub async fn create_session(pool: &DbPool, input: CreateSession) -> Result<Session> {
    let now = now_iso();
    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, created_at, updated_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&now)
    .bind(&now)
    .bind(format_expiry(input.expires_at))
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a session by ID.
/// Uses primary key index.
pub async fn get_session(pool: &DbPool, id: &str) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Refresh a session's updated_at and slide its expiry forward.
pub async fn touch_session(
    pool: &DbPool,
    id: &str,
    expires_at: DateTime<Utc>,
) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>(
        r#"
        UPDATE sessions
        SET updated_at = ?, expires_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(now_iso())
    .bind(format_expiry(expires_at))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Delete a session. Idempotent.
pub async fn delete_session(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete expired sessions.
/// Uses idx_sessions_expires index.
pub async fn cleanup_expired_sessions(pool: &DbPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(now_iso())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
