//! Application API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ApplicationInput, ApplicationPatch, ApplicationRecord};
use crate::AppState;

/// Query parameters for listing applications.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive filter on company or role.
    #[serde(default)]
    pub q: Option<String>,
    /// Keep only the first `limit` results, e.g. the dashboard's recent list.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/applications - List applications, newest first.
pub async fn list_applications(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Vec<ApplicationRecord>> {
    let mut applications = match params.q {
        Some(term) => state.repo.search(&term),
        None => state.repo.applications(),
    };
    if let Some(limit) = params.limit {
        applications.truncate(limit);
    }
    success(applications)
}

/// GET /api/applications/:id - Get a single application.
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApplicationRecord> {
    match state.repo.get(&id) {
        Some(application) => success(application),
        None => Err(AppError::NotFound(format!("Application {} not found", id))),
    }
}

/// POST /api/applications - Record a new application.
pub async fn create_application(
    State(state): State<AppState>,
    Json(input): Json<ApplicationInput>,
) -> ApiResult<ApplicationRecord> {
    let application = state.repo.add(input).await?;
    success(application)
}

/// PUT /api/applications/:id - Update fields of an application.
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ApplicationPatch>,
) -> ApiResult<ApplicationRecord> {
    if state.repo.get(&id).is_none() {
        return Err(AppError::NotFound(format!("Application {} not found", id)));
    }

    match state.repo.update(&id, patch).await? {
        Some(application) => success(application),
        // Removed by a concurrent request while the update was in flight.
        None => Err(AppError::NotFound(format!("Application {} not found", id))),
    }
}

/// DELETE /api/applications/:id - Delete an application.
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.remove(&id).await?;
    success(())
}
