//! Error handling module for the tracker service.
//!
//! Store and identity failures are typed here, along with the HTTP mapping used by
//! the API layer and its response envelope.

use std::fmt;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const NOT_INITIALIZED: &str = "NOT_INITIALIZED";
}

/// Category of a failed remote store round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreErrorKind {
    /// Network or connection failure.
    Transport,
    /// The store rejected our credentials.
    Auth,
    /// Constraint violation, e.g. a missing required field.
    Validation,
    /// Any other failure reported by the store.
    Query,
    /// The store answered with a row we could not read.
    Decode,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::Transport => "transport",
            StoreErrorKind::Auth => "auth",
            StoreErrorKind::Validation => "validation",
            StoreErrorKind::Query => "query",
            StoreErrorKind::Decode => "decode",
        }
    }
}

/// Failure of a single remote store round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Validation, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Decode, message)
    }

    pub fn is_validation(&self) -> bool {
        self.kind == StoreErrorKind::Validation
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store {} error: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match &err {
            sqlx::Error::Database(db_err) => {
                let constraint = matches!(
                    db_err.kind(),
                    sqlx::error::ErrorKind::NotNullViolation
                        | sqlx::error::ErrorKind::CheckViolation
                        | sqlx::error::ErrorKind::UniqueViolation
                        | sqlx::error::ErrorKind::ForeignKeyViolation
                ) || db_err.message().contains("constraint failed");
                if constraint {
                    StoreError::validation(db_err.message().to_string())
                } else {
                    StoreError::new(StoreErrorKind::Query, db_err.message().to_string())
                }
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::transport(format!("Database unavailable: {}", err))
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::decode(format!("Database decode error: {}", err))
            }
            _ => StoreError::new(StoreErrorKind::Query, format!("Database error: {}", err)),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Remote store error: {:?}", err);
        if err.is_decode() {
            StoreError::decode(format!("Malformed store response: {}", err))
        } else {
            StoreError::transport(format!("Remote store unreachable: {}", err))
        }
    }
}

/// Failure to establish or persist the owner identity.
#[derive(Debug)]
pub enum IdentityError {
    /// The identity file exists but could not be read.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A fresh identity could not be written.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Read { path, source } => {
                write!(f, "cannot read owner id from {}: {}", path.display(), source)
            }
            IdentityError::Write { path, source } => {
                write!(f, "cannot persist owner id to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentityError::Read { source, .. } | IdentityError::Write { source, .. } => Some(source),
        }
    }
}

/// Error returned by repository mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The remote round trip failed; the local collection is unchanged.
    Store(StoreError),
    /// The input was rejected before any remote call.
    Invalid(String),
    /// A mutation was attempted before the owner identity was resolved.
    NotInitialized,
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Store(err) => write!(f, "{}", err),
            RepositoryError::Invalid(msg) => write!(f, "invalid application: {}", msg),
            RepositoryError::NotInitialized => write!(f, "repository has not been initialized"),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        RepositoryError::Store(err)
    }
}

/// API error type.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Remote store failure
    Store(StoreError),
    /// Repository not ready
    NotInitialized,
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(err) => match err.kind {
                StoreErrorKind::Validation => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Store(err) if err.is_validation() => codes::VALIDATION_ERROR,
            AppError::Store(_) => codes::STORE_ERROR,
            AppError::NotInitialized => codes::NOT_INITIALIZED,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Store(err) => err.message.clone(),
            AppError::NotInitialized => "Tracker is still starting up".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Store(store) => AppError::Store(store),
            RepositoryError::Invalid(msg) => AppError::Validation(msg),
            RepositoryError::NotInitialized => AppError::NotInitialized,
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Store(err) => Some(serde_json::json!({ "storeKind": err.kind })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
