//! Todo list collection.

use axum::Router;
use serde_json::Value;

use super::collections::{bool_field, str_field, Collection};
use crate::db::{CollectionKind, Fields};
use crate::{AppState, Error, Result};

pub fn routes(state: AppState) -> Router<AppState> {
    super::collections::routes::<Todos>(state)
}

pub struct Todos;

impl Collection for Todos {
    const KIND: CollectionKind = CollectionKind::Todos;

    fn normalize_create(input: &Value) -> Result<Fields> {
        let text = str_field(input, "text").map(str::trim).unwrap_or("");
        if text.is_empty() {
            return Err(Error::Validation("Todo text is required".to_string()));
        }

        let done = bool_field(input, "done")?.unwrap_or(false);

        let mut fields = Fields::new();
        fields.insert("text".to_string(), Value::String(text.to_string()));
        fields.insert("done".to_string(), Value::Bool(done));

        Ok(fields)
    }

    fn normalize_update(input: &Value) -> Result<Fields> {
        let mut updates = Fields::new();

        if let Some(text) = str_field(input, "text") {
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::Validation("Todo text cannot be empty".to_string()));
            }
            updates.insert("text".to_string(), Value::String(text.to_string()));
        }

        if let Some(done) = bool_field(input, "done")? {
            updates.insert("done".to_string(), Value::Bool(done));
        }

        Ok(updates)
    }
}
