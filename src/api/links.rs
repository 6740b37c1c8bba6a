//! Saved links collection.
//!
//! A link is a labelled URL with an optional icon and a pinned flag.
//! `title` is accepted as an alias for `label` so older clients keep
//! working.

use axum::Router;
use serde_json::Value;

use super::collections::{bool_field, has_key, str_field, Collection};
use crate::db::{CollectionKind, Fields};
use crate::{AppState, Error, Result};

pub fn routes(state: AppState) -> Router<AppState> {
    super::collections::routes::<Links>(state)
}

pub struct Links;

impl Collection for Links {
    const KIND: CollectionKind = CollectionKind::Links;

    fn normalize_create(input: &Value) -> Result<Fields> {
        let label = str_field(input, "label")
            .or_else(|| str_field(input, "title"))
            .map(str::trim)
            .unwrap_or("");
        if label.is_empty() {
            return Err(Error::Validation("Label is required".to_string()));
        }

        let url = normalize_url(input.get("url"))?;

        let mut fields = Fields::new();
        fields.insert("label".to_string(), Value::String(label.to_string()));
        fields.insert("url".to_string(), Value::String(url));

        if let Some(icon_url) = str_field(input, "iconUrl") {
            fields.insert(
                "iconUrl".to_string(),
                Value::String(icon_url.trim().to_string()),
            );
        }
        if let Some(pinned) = bool_field(input, "pinned")? {
            fields.insert("pinned".to_string(), Value::Bool(pinned));
        }

        Ok(fields)
    }

    fn normalize_update(input: &Value) -> Result<Fields> {
        let mut updates = Fields::new();

        if let Some(label) = str_field(input, "label").or_else(|| str_field(input, "title")) {
            let label = label.trim();
            if label.is_empty() {
                return Err(Error::Validation("Label cannot be empty".to_string()));
            }
            updates.insert("label".to_string(), Value::String(label.to_string()));
        }

        if has_key(input, "url") {
            updates.insert(
                "url".to_string(),
                Value::String(normalize_url(input.get("url"))?),
            );
        }

        if has_key(input, "iconUrl") {
            // Non-string resets the icon
            let icon_url = str_field(input, "iconUrl").map(str::trim).unwrap_or("");
            updates.insert("iconUrl".to_string(), Value::String(icon_url.to_string()));
        }

        if let Some(pinned) = bool_field(input, "pinned")? {
            updates.insert("pinned".to_string(), Value::Bool(pinned));
        }

        Ok(updates)
    }
}

/// Trimmed URL, defaulting the scheme to https when none is given.
fn normalize_url(value: Option<&Value>) -> Result<String> {
    let raw = value
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if raw.is_empty() {
        return Err(Error::Validation("URL is required".to_string()));
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Ok(raw.to_string())
    } else {
        Ok(format!("https://{}", raw))
    }
}
