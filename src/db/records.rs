//! Per-user dashboard record storage.
//!
//! All four collections (links, todos, notes, events) share one table.
//! Collection-specific fields are stored as a JSON object in the
//! `fields` column and spread into the top level of the API shape, so
//! the storage layer stays schema-less and the normalizers own the
//! field rules. Records are keyed by (collection, user, id); another
//! user's record id behaves exactly like a missing record.

use crate::{Error, Result};
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::{new_id, now_iso, DbPool};

// ============================================================================
// Types
// ============================================================================

/// Collection-specific fields of a record, keyed by API field name.
pub type Fields = Map<String, Value>;

/// The dashboard collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Links,
    Todos,
    Notes,
    Events,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Links => "links",
            Self::Todos => "todos",
            Self::Notes => "notes",
            Self::Events => "events",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct RecordRow {
    id: String,
    fields: String,
    created_at: String,
    updated_at: String,
}

/// A stored record with parsed fields.
#[derive(Debug, Clone)]
pub struct Record {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub fields: Fields,
}

impl Record {
    fn from_row(row: RecordRow) -> Result<Self> {
        let fields: Fields = serde_json::from_str(&row.fields)
            .map_err(|e| Error::Internal(format!("Corrupt record fields: {}", e)))?;
        Ok(Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            fields,
        })
    }

    /// API representation: `{id, createdAt, updatedAt, ...fields}`.
    pub fn into_json(self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id));
        map.insert("createdAt".to_string(), Value::String(self.created_at));
        map.insert("updatedAt".to_string(), Value::String(self.updated_at));
        for (key, value) in self.fields {
            map.insert(key, value);
        }
        Value::Object(map)
    }
}

/// Merge update fields into existing fields.
/// A null value removes the key (how events clear endISO).
pub fn merge_fields(existing: &Fields, updates: Fields) -> Fields {
    let mut merged = existing.clone();
    for (key, value) in updates {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    merged
}

// ============================================================================
// Queries
// ============================================================================

/// List a user's records in insertion order.
pub async fn list_records(
    pool: &DbPool,
    kind: CollectionKind,
    user_id: &str,
) -> Result<Vec<Record>> {
    let rows = sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM records
        WHERE collection = ? AND user_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(kind.as_str())
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Record::from_row).collect()
}

/// Get a single record scoped to its owner.
pub async fn get_record(
    pool: &DbPool,
    kind: CollectionKind,
    user_id: &str,
    id: &str,
) -> Result<Option<Record>> {
    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT id, fields, created_at, updated_at
        FROM records
        WHERE collection = ? AND user_id = ? AND id = ?
        "#,
    )
    .bind(kind.as_str())
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Record::from_row).transpose()
}

/// Insert a record with a fresh id and timestamps.
pub async fn create_record(
    pool: &DbPool,
    kind: CollectionKind,
    user_id: &str,
    fields: Fields,
) -> Result<Record> {
    let now = now_iso();
    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        INSERT INTO records (collection, user_id, id, fields, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, fields, created_at, updated_at
        "#,
    )
    .bind(kind.as_str())
    .bind(user_id)
    .bind(new_id())
    .bind(serde_json::to_string(&fields)?)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    Record::from_row(row)
}

/// Merge updates into a record and refresh updated_at.
/// Returns None when the record does not exist for this user.
pub async fn update_record(
    pool: &DbPool,
    kind: CollectionKind,
    user_id: &str,
    id: &str,
    updates: Fields,
) -> Result<Option<Record>> {
    let existing = match get_record(pool, kind, user_id, id).await? {
        Some(record) => record,
        None => return Ok(None),
    };

    let merged = merge_fields(&existing.fields, updates);

    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        UPDATE records
        SET fields = ?, updated_at = ?
        WHERE collection = ? AND user_id = ? AND id = ?
        RETURNING id, fields, created_at, updated_at
        "#,
    )
    .bind(serde_json::to_string(&merged)?)
    .bind(now_iso())
    .bind(kind.as_str())
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Record::from_row).transpose()
}

/// Delete a record, returning it when it existed.
pub async fn delete_record(
    pool: &DbPool,
    kind: CollectionKind,
    user_id: &str,
    id: &str,
) -> Result<Option<Record>> {
    let row = sqlx::query_as::<_, RecordRow>(
        r#"
        DELETE FROM records
        WHERE collection = ? AND user_id = ? AND id = ?
        RETURNING id, fields, created_at, updated_at
        "#,
    )
    .bind(kind.as_str())
    .bind(user_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Record::from_row).transpose()
}
