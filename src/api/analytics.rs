//! Statistics, analytics and sync endpoints.

use axum::extract::State;
use serde::Serialize;

use super::{success, ApiResult};
use crate::stats::{PlatformCount, Stats, StatusCount};
use crate::AppState;

/// Chart data for the analytics view.
#[derive(Debug, Serialize)]
pub struct Analytics {
    pub total: usize,
    pub statuses: Vec<StatusCount>,
    pub platforms: Vec<PlatformCount>,
}

/// Sync state of the repository as seen by consumers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub owner_id: Option<String>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub count: usize,
}

impl SyncStatus {
    fn current(state: &AppState) -> Self {
        let snapshot = state.repo.snapshot();
        Self {
            owner_id: state.repo.owner_id().map(ToString::to_string),
            loading: snapshot.loading,
            last_error: snapshot.last_error,
            count: snapshot.applications.len(),
        }
    }
}

/// GET /api/stats - Dashboard counts per status.
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Stats> {
    success(state.repo.stats())
}

/// GET /api/analytics - Status distribution and platform breakdown.
pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Analytics> {
    success(Analytics {
        total: state.repo.stats().total,
        statuses: state.repo.status_distribution(),
        platforms: state.repo.platform_breakdown(),
    })
}

/// POST /api/refresh - Re-fetch applications from the store.
///
/// A failed refresh still answers 200; the cached list is kept and the error is
/// reported in `lastError`.
pub async fn refresh(State(state): State<AppState>) -> ApiResult<SyncStatus> {
    state.repo.refresh().await;
    success(SyncStatus::current(&state))
}

/// GET /api/status - Owner id, loading flag and last refresh error.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<SyncStatus> {
    success(SyncStatus::current(&state))
}
