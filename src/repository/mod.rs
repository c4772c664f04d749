//! Application repository: the single owner of the cached application list.
//!
//! Mutations are remote-first. The store call runs to completion before the
//! cache is touched, so a failed call never leaves a phantom change behind.
//! Round trips are not serialized; concurrent mutations land in completion order.
//!
//! Consumers read through [`ApplicationRepository::snapshot`] or follow changes
//! through the `watch` receiver returned by [`ApplicationRepository::subscribe`].

use std::cmp::Reverse;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::errors::{IdentityError, RepositoryError, StoreError};
use crate::identity::{IdentityProvider, OwnerId};
use crate::models::{ApplicationInput, ApplicationPatch, ApplicationRecord};
use crate::normalize::{to_canonical, to_raw, OWNER_KEY};
use crate::stats::{self, PlatformCount, Stats, StatusCount};
use crate::store::RemoteStore;

/// Point-in-time view of the repository state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Newest first by creation time.
    pub applications: Vec<ApplicationRecord>,
    pub loading: bool,
    /// Message of the most recent failed refresh, cleared by a successful one.
    pub last_error: Option<String>,
}

pub struct ApplicationRepository {
    store: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
    owner: OnceLock<OwnerId>,
    state: watch::Sender<Snapshot>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn RemoteStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(Snapshot {
            loading: true,
            ..Snapshot::default()
        });
        Self {
            store,
            identity,
            owner: OnceLock::new(),
            state,
        }
    }

    /// Resolve the owner identity and load its applications.
    ///
    /// An identity failure is fatal for the session and is returned; a store
    /// failure during the initial load is not (see [`Self::refresh`]).
    pub async fn initialize(&self) -> Result<(), IdentityError> {
        let owner = match self.identity.resolve_owner_id().await {
            Ok(owner) => owner,
            Err(e) => {
                tracing::error!("Cannot establish owner identity: {}", e);
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(e.to_string());
                });
                return Err(e);
            }
        };

        if let Err(ignored) = self.owner.set(owner) {
            tracing::warn!("Repository already initialized, ignoring owner id {}", ignored);
        }
        if let Some(owner) = self.owner.get() {
            tracing::info!("Tracking applications for owner {}", owner);
        }

        self.refresh().await;
        Ok(())
    }

    /// Replace the cache with the store's current rows.
    ///
    /// On failure the previous collection stays in place and the error is
    /// logged and recorded on the snapshot.
    pub async fn refresh(&self) {
        let Some(owner) = self.owner.get() else {
            tracing::warn!("Refresh requested before the repository was initialized");
            return;
        };

        self.state.send_modify(|s| s.loading = true);

        match self.fetch_all(owner).await {
            Ok(applications) => {
                tracing::info!("Loaded {} applications", applications.len());
                self.state.send_modify(|s| {
                    s.applications = applications;
                    s.loading = false;
                    s.last_error = None;
                });
            }
            Err(e) => {
                tracing::warn!("Refresh failed, keeping cached applications: {}", e);
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(e.to_string());
                });
            }
        }
    }

    async fn fetch_all(&self, owner: &OwnerId) -> Result<Vec<ApplicationRecord>, StoreError> {
        let rows = self.store.list_all(owner).await?;

        let mut applications: Vec<_> = rows.into_iter().map(to_canonical).collect();
        sort_newest_first(&mut applications);
        Ok(applications)
    }

    /// Create an application. The cache only changes once the store confirms.
    pub async fn add(&self, input: ApplicationInput) -> Result<ApplicationRecord, RepositoryError> {
        let owner = self.owner()?;
        input.validate().map_err(RepositoryError::Invalid)?;

        let input = input.with_defaults(Local::now().date_naive());
        let mut row = to_raw(&input);
        row.insert(OWNER_KEY.to_string(), Value::String(owner.to_string()));

        let created = self.store.insert(row).await.map_err(|e| {
            tracing::warn!("Failed to add application for {}: {}", input.company, e);
            e
        })?;
        let record = to_canonical(created);

        self.state.send_modify(|s| {
            s.applications.retain(|a| a.id != record.id);
            s.applications.insert(0, record.clone());
        });
        tracing::info!("Added application {} ({} / {})", record.id, record.company, record.role);
        Ok(record)
    }

    /// Apply `patch` to application `id`.
    ///
    /// Returns the merged record, or `None` when `id` is not in the cache (the
    /// store treats that as a no-op as well).
    pub async fn update(
        &self,
        id: &str,
        patch: ApplicationPatch,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        self.owner()?;
        patch.validate().map_err(RepositoryError::Invalid)?;
        if patch.is_empty() {
            return Ok(self.get(id));
        }

        self.store.update(id, to_raw(&patch)).await.map_err(|e| {
            tracing::warn!("Failed to update application {}: {}", id, e);
            e
        })?;

        let mut merged = None;
        self.state.send_modify(|s| {
            if let Some(record) = s.applications.iter_mut().find(|a| a.id == id) {
                patch.apply_to(record);
                merged = Some(record.clone());
            }
        });
        tracing::info!("Updated application {}", id);
        Ok(merged)
    }

    /// Delete application `id`. Deleting an unknown id succeeds.
    pub async fn remove(&self, id: &str) -> Result<(), RepositoryError> {
        self.owner()?;

        self.store.delete(id).await.map_err(|e| {
            tracing::warn!("Failed to delete application {}: {}", id, e);
            e
        })?;

        self.state.send_modify(|s| s.applications.retain(|a| a.id != id));
        tracing::info!("Removed application {}", id);
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        stats::compute_stats(&self.state.borrow().applications)
    }

    pub fn status_distribution(&self) -> Vec<StatusCount> {
        stats::status_distribution(&self.state.borrow().applications)
    }

    pub fn platform_breakdown(&self) -> Vec<PlatformCount> {
        stats::platform_breakdown(&self.state.borrow().applications)
    }

    /// Applications whose company or role contains `term`, newest first.
    pub fn search(&self, term: &str) -> Vec<ApplicationRecord> {
        self.state
            .borrow()
            .applications
            .iter()
            .filter(|a| a.matches(term))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<ApplicationRecord> {
        self.state
            .borrow()
            .applications
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn applications(&self) -> Vec<ApplicationRecord> {
        self.state.borrow().applications.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn owner_id(&self) -> Option<&OwnerId> {
        self.owner.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    fn owner(&self) -> Result<&OwnerId, RepositoryError> {
        self.owner.get().ok_or(RepositoryError::NotInitialized)
    }
}

/// Stable sort by `created_at`, newest first. Rows with an unparseable timestamp
/// go last, keeping their relative order.
fn sort_newest_first(applications: &mut [ApplicationRecord]) {
    applications.sort_by_key(|a| Reverse(DateTime::parse_from_rfc3339(&a.created_at).ok()));
}
