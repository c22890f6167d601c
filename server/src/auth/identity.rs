//! Local user identities and the store that owns them.
//!
//! # Thread Safety
//!
//! `UserStore` implementations are shared across request tasks. They, not the
//! resolver, guarantee that an external id maps to at most one record.
//!
//! # Invariants
//!
//! - `external_id` is unique across all records of a store
//! - A record is never modified by identity resolution once created

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use super::profile::ProviderProfile;

/// The service's own user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalIdentity {
    /// Store-assigned id.
    pub id: u64,
    /// Id of the user at the identity provider.
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
}

/// Fields for a record that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
}

impl From<&ProviderProfile> for NewIdentity {
    fn from(profile: &ProviderProfile) -> Self {
        Self {
            external_id: profile.external_id(),
            name: profile.display_name().to_string(),
            email: profile.email().map(str::to_string),
        }
    }
}

/// Errors reported by a user store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// A record with this external id already exists.
    #[error("identity with external id {external_id} already exists")]
    Conflict { external_id: String },
    /// The backing store could not serve the request.
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for local identities.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a record by its provider id.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LocalIdentity>, UserStoreError>;

    /// Create a record.
    ///
    /// # Errors
    ///
    /// Must return `UserStoreError::Conflict` when a record with the same
    /// external id exists, including one created concurrently.
    async fn create(&self, identity: NewIdentity) -> Result<LocalIdentity, UserStoreError>;
}

/// Process-local `UserStore` backed by a map keyed on external id.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, LocalIdentity>>,
    next_id: AtomicU64,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, UserStoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, UserStoreError> {
        Ok(self.len()? == 0)
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, LocalIdentity>>, UserStoreError>
    {
        self.users
            .read()
            .map_err(|_| UserStoreError::Unavailable("user map lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<LocalIdentity>, UserStoreError> {
        Ok(self.read()?.get(external_id).cloned())
    }

    #[allow(clippy::significant_drop_tightening)] // The lock must cover check and insert
    async fn create(&self, identity: NewIdentity) -> Result<LocalIdentity, UserStoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| UserStoreError::Unavailable("user map lock poisoned".to_string()))?;

        if users.contains_key(&identity.external_id) {
            return Err(UserStoreError::Conflict {
                external_id: identity.external_id,
            });
        }

        let record = LocalIdentity {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            external_id: identity.external_id,
            name: identity.name,
            email: identity.email,
        };
        users.insert(record.external_id.clone(), record.clone());
        Ok(record)
    }
}
