//! Remote store adapters.
//!
//! The repository only ever talks to a single table of application rows through
//! [`RemoteStore`]. Two backends are provided: a SQLite file for local use and a
//! PostgREST-compatible HTTP endpoint.

mod postgrest;
mod sqlite;

pub use postgrest::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::identity::OwnerId;
use crate::normalize::RawRow;

/// Columns of the application table, in store spelling.
pub const COLUMNS: [&str; 10] = [
    "id",
    "company",
    "role",
    "status",
    "dateapplied",
    "platform",
    "location",
    "notes",
    "user_id",
    "created_at",
];

/// Columns a caller may change after creation.
pub const MUTABLE_COLUMNS: [&str; 7] = [
    "company",
    "role",
    "status",
    "dateapplied",
    "platform",
    "location",
    "notes",
];

/// Row-oriented store holding application rows.
///
/// Every call is a single round trip with no retry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All rows owned by `owner`, newest first by `created_at`.
    async fn list_all(&self, owner: &OwnerId) -> Result<Vec<RawRow>, StoreError>;

    /// Insert a row and return it with `id` and `created_at` filled in.
    async fn insert(&self, row: RawRow) -> Result<RawRow, StoreError>;

    /// Overwrite the given columns of row `id`. A missing id is not an error.
    async fn update(&self, id: &str, patch: RawRow) -> Result<(), StoreError>;

    /// Delete row `id`. A missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
