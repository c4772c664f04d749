//! Owner identity resolution.
//!
//! The tracker has no accounts; rows are scoped by a pseudonymous owner id that is
//! generated once per local environment and kept in a small file.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::IdentityError;

/// Pseudonymous identifier scoping which rows belong to this client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the owner id for the current session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_owner_id(&self) -> Result<OwnerId, IdentityError>;
}

/// Identity persisted as a single line in a local file.
#[derive(Debug, Clone)]
pub struct FileIdentity {
    path: PathBuf,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn persist(&self, owner: &OwnerId) -> Result<(), IdentityError> {
        let write_err = |source| IdentityError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }
        tokio::fs::write(&self.path, owner.as_str())
            .await
            .map_err(write_err)
    }
}

#[async_trait]
impl IdentityProvider for FileIdentity {
    async fn resolve_owner_id(&self) -> Result<OwnerId, IdentityError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let existing = contents.trim();
                if !existing.is_empty() {
                    tracing::debug!("Reusing owner id from {:?}", self.path);
                    return Ok(OwnerId::new(existing));
                }
                tracing::warn!("Owner id file {:?} is empty, generating a new id", self.path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(IdentityError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        }

        let owner = OwnerId::generate();
        self.persist(&owner).await?;
        tracing::info!("Generated new owner id, stored at {:?}", self.path);
        Ok(owner)
    }
}
