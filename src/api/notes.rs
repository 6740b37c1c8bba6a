//! Notes collection. The body is required, the title optional and
//! allowed to be empty.

use axum::Router;
use serde_json::Value;

use super::collections::{has_key, str_field, Collection};
use crate::db::{CollectionKind, Fields};
use crate::{AppState, Error, Result};

pub fn routes(state: AppState) -> Router<AppState> {
    super::collections::routes::<Notes>(state)
}

pub struct Notes;

impl Collection for Notes {
    const KIND: CollectionKind = CollectionKind::Notes;

    fn normalize_create(input: &Value) -> Result<Fields> {
        let body = str_field(input, "body").map(str::trim).unwrap_or("");
        if body.is_empty() {
            return Err(Error::Validation("Note body is required".to_string()));
        }

        let mut fields = Fields::new();
        fields.insert("body".to_string(), Value::String(body.to_string()));

        if let Some(title) = str_field(input, "title") {
            fields.insert("title".to_string(), Value::String(title.trim().to_string()));
        }

        Ok(fields)
    }

    fn normalize_update(input: &Value) -> Result<Fields> {
        let mut updates = Fields::new();

        if let Some(body) = str_field(input, "body") {
            let body = body.trim();
            if body.is_empty() {
                return Err(Error::Validation("Note body cannot be empty".to_string()));
            }
            updates.insert("body".to_string(), Value::String(body.to_string()));
        }

        if has_key(input, "title") {
            // Non-string clears the title
            let title = str_field(input, "title").map(str::trim).unwrap_or("");
            updates.insert("title".to_string(), Value::String(title.to_string()));
        }

        Ok(updates)
    }
}
