//! Shared plumbing for the dashboard collections.
//!
//! Each collection (links, todos, notes, events) stores free-form JSON
//! fields under a per-user namespace and exposes the same four routes:
//!
//! - GET / - List the caller's records
//! - POST / - Create a record (201)
//! - PUT /:id - Merge updates into a record
//! - DELETE /:id - Delete a record, returning it
//!
//! A collection only has to say how payloads normalize; the handlers,
//! ownership scoping, and session guard are identical across all four.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{middleware, Extension, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::{ApiJson, Envelope};
use crate::db::{self, CollectionKind, Fields, PublicUser, Record};
use crate::middleware::require_session;
use crate::{AppState, Error, Result};

/// Optional list bounds. Only events interpret them; the other
/// collections ignore unknown query parameters the same way.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Behavior a dashboard collection plugs into the shared handlers.
pub trait Collection: Send + Sync + 'static {
    /// Namespace the records are stored under.
    const KIND: CollectionKind;

    /// Validate a create payload and produce the fields to store.
    fn normalize_create(input: &Value) -> Result<Fields>;

    /// Validate an update payload and produce the fields to merge.
    /// A `Null` value marks the field for removal.
    fn normalize_update(input: &Value) -> Result<Fields>;

    /// Cross-field validation against the record being updated. Runs
    /// after the record is known to exist.
    fn validate_update(_existing: &Fields, _updates: &Fields) -> Result<()> {
        Ok(())
    }

    /// Post-process a listing (filtering, ordering).
    fn prepare_list(records: Vec<Value>, _query: &ListQuery) -> Vec<Value> {
        records
    }
}

/// Build the four routes for one collection, all behind the session
/// guard.
pub fn routes<C: Collection>(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list::<C>).post(create::<C>))
        .route("/:id", put(update::<C>).delete(remove::<C>))
        .layer(middleware::from_fn_with_state(state, require_session))
}

async fn list<C: Collection>(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Value>>>> {
    let records = db::list_records(&state.db, C::KIND, &user.id).await?;
    let values = records.into_iter().map(Record::into_json).collect();
    Ok(Json(Envelope::data(C::prepare_list(values, &query))))
}

async fn create<C: Collection>(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<Envelope<Value>>)> {
    let fields = C::normalize_create(&body)?;
    let record = db::create_record(&state.db, C::KIND, &user.id, fields).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(record.into_json()))))
}

async fn update<C: Collection>(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Envelope<Value>>> {
    let updates = C::normalize_update(&body)?;
    if updates.is_empty() {
        return Err(Error::Validation("No fields to update".to_string()));
    }

    let existing = db::get_record(&state.db, C::KIND, &user.id, &id)
        .await?
        .ok_or_else(record_not_found)?;

    C::validate_update(&existing.fields, &updates)?;

    let updated = db::update_record(&state.db, C::KIND, &user.id, &id, updates)
        .await?
        .ok_or_else(record_not_found)?;

    Ok(Json(Envelope::data(updated.into_json())))
}

async fn remove<C: Collection>(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Value>>> {
    let removed = db::delete_record(&state.db, C::KIND, &user.id, &id)
        .await?
        .ok_or_else(record_not_found)?;

    Ok(Json(Envelope::data(removed.into_json())))
}

fn record_not_found() -> Error {
    Error::NotFound("Record not found".to_string())
}

// ============================================================================
// Payload helpers shared by the collection normalizers
// ============================================================================

/// String value at `key`, if the key holds a string.
pub(super) fn str_field<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

/// Whether the payload carries `key` at all (any value, including null).
pub(super) fn has_key(input: &Value, key: &str) -> bool {
    input.get(key).is_some()
}

/// Boolean value at `key`. Present but non-boolean is a validation
/// error rather than a silent default.
pub(super) fn bool_field(input: &Value, key: &str) -> Result<Option<bool>> {
    match input.get(key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(Error::Validation(format!("{} must be a boolean", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_field_only_matches_strings() {
        let input = json!({"a": "x", "b": 7, "c": null});
        assert_eq!(str_field(&input, "a"), Some("x"));
        assert_eq!(str_field(&input, "b"), None);
        assert_eq!(str_field(&input, "c"), None);
        assert_eq!(str_field(&input, "missing"), None);
    }

    #[test]
    fn test_has_key_counts_null() {
        let input = json!({"a": null});
        assert!(has_key(&input, "a"));
        assert!(!has_key(&input, "b"));
    }

    #[test]
    fn test_bool_field_rejects_non_boolean() {
        let input = json!({"ok": true, "bad": "yes"});
        assert_eq!(bool_field(&input, "ok").unwrap(), Some(true));
        assert_eq!(bool_field(&input, "missing").unwrap(), None);
        let err = bool_field(&input, "bad").unwrap_err();
        assert_eq!(err.to_string(), "bad must be a boolean");
    }
}
