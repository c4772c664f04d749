//! SQLite-backed application store.
//!
//! Mirrors the hosted table layout so the same rows can move between backends.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use super::{RemoteStore, COLUMNS, MUTABLE_COLUMNS};
use crate::errors::StoreError;
use crate::identity::OwnerId;
use crate::normalize::{RawRow, OWNER_KEY};

const SELECT_COLUMNS: &str =
    "id, company, role, status, dateapplied, platform, location, notes, user_id, created_at";

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            company TEXT NOT NULL CHECK (length(trim(company)) > 0),
            role TEXT NOT NULL CHECK (length(trim(role)) > 0),
            status TEXT NOT NULL DEFAULT 'Applied',
            dateapplied TEXT NOT NULL,
            platform TEXT NOT NULL DEFAULT 'LinkedIn',
            location TEXT,
            notes TEXT,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_applications_owner_created
            ON applications(user_id, created_at DESC);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Application rows kept in a local SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `db_path`.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let pool = init_database(db_path).await?;
        Ok(Self::new(pool))
    }

    async fn fetch(&self, id: &str) -> Result<Option<RawRow>, StoreError> {
        let sql = format!("SELECT {} FROM applications WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(raw_from_row).transpose()
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn list_all(&self, owner: &OwnerId) -> Result<Vec<RawRow>, StoreError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(raw_from_row).collect()
    }

    async fn insert(&self, row: RawRow) -> Result<RawRow, StoreError> {
        for key in row.keys() {
            if key != OWNER_KEY && !MUTABLE_COLUMNS.contains(&key.as_str()) {
                return Err(StoreError::validation(format!(
                    "column `{}` cannot be written on insert",
                    key
                )));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let text = |key: &str| match row.get(key) {
            Some(value) => column_text(key, value),
            None => Ok(None),
        };

        sqlx::query(
            "INSERT INTO applications (id, company, role, status, dateapplied, platform, location, notes, user_id, created_at) \
             VALUES (?, ?, ?, COALESCE(?, 'Applied'), COALESCE(?, date('now')), COALESCE(?, 'LinkedIn'), ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(text("company")?)
        .bind(text("role")?)
        .bind(text("status")?)
        .bind(text("dateapplied")?)
        .bind(text("platform")?)
        .bind(text("location")?)
        .bind(text("notes")?)
        .bind(text(OWNER_KEY)?)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Inserted application row {}", id);

        self.fetch(&id)
            .await?
            .ok_or_else(|| StoreError::decode(format!("Inserted row {} could not be read back", id)))
    }

    async fn update(&self, id: &str, patch: RawRow) -> Result<(), StoreError> {
        let mut assignments = Vec::with_capacity(patch.len());
        let mut values = Vec::with_capacity(patch.len());
        for (key, value) in &patch {
            if !MUTABLE_COLUMNS.contains(&key.as_str()) {
                return Err(StoreError::validation(format!(
                    "column `{}` cannot be updated",
                    key
                )));
            }
            assignments.push(format!("{} = ?", key));
            values.push(column_text(key, value)?);
        }

        if assignments.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE applications SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value);
        }
        let result = query.bind(id).execute(&self.pool).await?;

        tracing::debug!(
            "Updated application row {} ({} rows affected)",
            id,
            result.rows_affected()
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Deleted application row {} ({} rows affected)",
            id,
            result.rows_affected()
        );
        Ok(())
    }
}

fn raw_from_row(row: &SqliteRow) -> Result<RawRow, StoreError> {
    let mut raw = RawRow::new();
    for column in COLUMNS {
        let value: Option<String> = row.try_get(column)?;
        raw.insert(
            column.to_string(),
            value.map(Value::String).unwrap_or(Value::Null),
        );
    }
    Ok(raw)
}

fn column_text(key: &str, value: &Value) -> Result<Option<String>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(StoreError::validation(format!(
            "column `{}` cannot hold {}",
            key, other
        ))),
    }
}
