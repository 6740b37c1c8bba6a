//! Calendar events collection.
//!
//! Events carry a required start instant and an optional end instant;
//! both are stored in canonical RFC3339 form regardless of how the
//! client spelled them. Listing accepts `from`/`to` bounds on the
//! start instant and always sorts ascending by start.

use std::cmp::Ordering;

use axum::Router;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::collections::{bool_field, has_key, str_field, Collection, ListQuery};
use crate::db::{CollectionKind, Fields};
use crate::{AppState, Error, Result};

pub fn routes(state: AppState) -> Router<AppState> {
    super::collections::routes::<Events>(state)
}

pub struct Events;

impl Collection for Events {
    const KIND: CollectionKind = CollectionKind::Events;

    fn normalize_create(input: &Value) -> Result<Fields> {
        let title = str_field(input, "title").map(str::trim).unwrap_or("");
        if title.is_empty() {
            return Err(Error::Validation("Event title is required".to_string()));
        }

        let start = str_field(input, "startISO")
            .and_then(parse_instant)
            .ok_or_else(|| Error::Validation("Valid startISO is required".to_string()))?;

        let mut fields = Fields::new();
        fields.insert("title".to_string(), Value::String(title.to_string()));
        fields.insert("startISO".to_string(), Value::String(canonical_iso(start)));

        if let Some(end) = parse_end(input)? {
            if end < start {
                return Err(Error::Validation(
                    "endISO must be after startISO".to_string(),
                ));
            }
            fields.insert("endISO".to_string(), Value::String(canonical_iso(end)));
        }

        if let Some(all_day) = bool_field(input, "allDay")? {
            fields.insert("allDay".to_string(), Value::Bool(all_day));
        }
        if let Some(description) = str_field(input, "description") {
            fields.insert(
                "description".to_string(),
                Value::String(description.trim().to_string()),
            );
        }
        if let Some(location) = str_field(input, "location") {
            fields.insert(
                "location".to_string(),
                Value::String(location.trim().to_string()),
            );
        }

        Ok(fields)
    }

    fn normalize_update(input: &Value) -> Result<Fields> {
        let mut updates = Fields::new();
        let mut new_start = None;

        if let Some(title) = str_field(input, "title") {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::Validation(
                    "Event title cannot be empty".to_string(),
                ));
            }
            updates.insert("title".to_string(), Value::String(title.to_string()));
        }

        if has_key(input, "startISO") {
            let start = str_field(input, "startISO")
                .and_then(parse_instant)
                .ok_or_else(|| {
                    Error::Validation("startISO must be a valid ISO string".to_string())
                })?;
            updates.insert("startISO".to_string(), Value::String(canonical_iso(start)));
            new_start = Some(start);
        }

        if has_key(input, "endISO") {
            match parse_end(input)? {
                // Null survives to the merge, which drops the field
                None => {
                    updates.insert("endISO".to_string(), Value::Null);
                }
                Some(end) => {
                    if let Some(start) = new_start {
                        if end < start {
                            return Err(Error::Validation(
                                "endISO must be after startISO".to_string(),
                            ));
                        }
                    }
                    updates.insert("endISO".to_string(), Value::String(canonical_iso(end)));
                }
            }
        }

        if let Some(all_day) = bool_field(input, "allDay")? {
            updates.insert("allDay".to_string(), Value::Bool(all_day));
        }
        if has_key(input, "description") {
            let description = str_field(input, "description").map(str::trim).unwrap_or("");
            updates.insert(
                "description".to_string(),
                Value::String(description.to_string()),
            );
        }
        if has_key(input, "location") {
            let location = str_field(input, "location").map(str::trim).unwrap_or("");
            updates.insert("location".to_string(), Value::String(location.to_string()));
        }

        Ok(updates)
    }

    /// The end must not precede the start once updates land, including
    /// when only one of the two is in the payload.
    fn validate_update(existing: &Fields, updates: &Fields) -> Result<()> {
        let start = updates
            .get("startISO")
            .or_else(|| existing.get("startISO"))
            .and_then(Value::as_str)
            .and_then(parse_instant);

        let end = match updates.get("endISO") {
            // Being cleared: nothing left to compare
            Some(Value::Null) => None,
            Some(value) => value.as_str().and_then(parse_instant),
            None => existing
                .get("endISO")
                .and_then(Value::as_str)
                .and_then(parse_instant),
        };

        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(Error::Validation(
                    "endISO must be after startISO".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn prepare_list(records: Vec<Value>, query: &ListQuery) -> Vec<Value> {
        let from = query.from.as_deref().and_then(parse_instant);
        let to = query.to.as_deref().and_then(parse_instant);

        let mut filtered: Vec<Value> = records
            .into_iter()
            .filter(|record| {
                if from.is_none() && to.is_none() {
                    return true;
                }
                // Bounds only keep records with a readable start
                let Some(start) = record_start(record) else {
                    return false;
                };
                if let Some(from) = from {
                    if start < from {
                        return false;
                    }
                }
                if let Some(to) = to {
                    if start > to {
                        return false;
                    }
                }
                true
            })
            .collect();

        filtered.sort_by(|a, b| match (record_start(a), record_start(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        });

        filtered
    }
}

/// Permissive instant parsing: RFC3339 with or without offset or
/// fractional seconds, plus bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn canonical_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The `endISO` value, where absent, null, and `""` all mean "no end".
fn parse_end(input: &Value) -> Result<Option<DateTime<Utc>>> {
    match input.get("endISO") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.is_empty() => Ok(None),
        Some(value) => value
            .as_str()
            .and_then(parse_instant)
            .map(Some)
            .ok_or_else(|| Error::Validation("endISO must be a valid ISO string".to_string())),
    }
}

fn record_start(record: &Value) -> Option<DateTime<Utc>> {
    record
        .get("startISO")
        .and_then(Value::as_str)
        .and_then(parse_instant)
}
