//! Field normalization between store rows and canonical records.
//!
//! The store spells the application date `dateapplied`; everything inside the
//! service uses `dateApplied`. Every other key passes through untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::ApplicationRecord;

/// A row as the remote store sees it: column name to JSON value.
pub type RawRow = Map<String, Value>;

/// Date key as persisted by the store.
pub const STORE_DATE_KEY: &str = "dateapplied";
/// Date key in the canonical shape.
pub const CANONICAL_DATE_KEY: &str = "dateApplied";
/// Owner column, shared by both shapes.
pub const OWNER_KEY: &str = "user_id";

/// Rename store keys to canonical keys.
///
/// A row that already carries `dateApplied` keeps a single date key: the store
/// spelling wins unless its value is null.
pub fn canonical_keys(raw: RawRow) -> RawRow {
    rename_key(raw, STORE_DATE_KEY, CANONICAL_DATE_KEY)
}

/// Rename canonical keys to store keys.
pub fn store_keys(row: RawRow) -> RawRow {
    rename_key(row, CANONICAL_DATE_KEY, STORE_DATE_KEY)
}

fn rename_key(mut row: RawRow, from: &str, to: &str) -> RawRow {
    if let Some(value) = row.remove(from) {
        if !value.is_null() || !row.contains_key(to) {
            row.insert(to.to_string(), value);
        }
    }
    row
}

/// Convert a store row into a canonical record.
///
/// Absent or mistyped fields are carried over as they are; checking them is up to
/// the write path.
pub fn to_canonical(raw: RawRow) -> ApplicationRecord {
    ApplicationRecord::from(canonical_keys(raw))
}

/// Convert a record, input or patch into a store row.
pub fn to_raw<T: Serialize>(value: &T) -> RawRow {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => store_keys(map),
        Ok(other) => {
            tracing::warn!("Expected an object to denormalize, got {}", other);
            RawRow::new()
        }
        Err(e) => {
            tracing::warn!("Failed to denormalize value: {}", e);
            RawRow::new()
        }
    }
}
