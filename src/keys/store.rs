// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Credential persistence.
//!
//! [`CredentialStore`] is the seam to whatever persists credentials between runs.
//! [`CredentialRegistry`] applies administrative operations to a live
//! [`ApiKeyPool`] and mirrors the successful ones to the store, so the two never
//! diverge: if the store write fails, the pool change is rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::pool::{ApiKeyPool, Credential};
use crate::errors::KeyPoolError;

/// Persistence backend for credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns every stored credential.
    async fn list_credentials(&self) -> Result<Vec<Credential>, KeyPoolError>;

    /// Stores a new credential.
    async fn add_credential(&self, credential: &Credential) -> Result<(), KeyPoolError>;

    /// Deletes the credential with the given key value.
    async fn remove_credential(&self, key: &str) -> Result<(), KeyPoolError>;

    /// Replaces a stored credential with an updated copy.
    async fn update_credential(&self, credential: &Credential) -> Result<(), KeyPoolError> {
        self.remove_credential(&credential.key).await?;
        self.add_credential(credential).await
    }
}

/// A [`CredentialStore`] that keeps credentials in memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Vec<Credential>>,
}

impl MemoryCredentialStore {
    /// Creates a store pre-populated with `credentials`.
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn list_credentials(&self) -> Result<Vec<Credential>, KeyPoolError> {
        Ok(self.credentials.lock().await.clone())
    }

    async fn add_credential(&self, credential: &Credential) -> Result<(), KeyPoolError> {
        let mut credentials = self.credentials.lock().await;
        if let Some(existing) = credentials.iter().find(|c| c.key == credential.key) {
            return Err(KeyPoolError::DuplicateKey {
                name: existing.name.clone(),
            });
        }
        credentials.push(credential.clone());
        Ok(())
    }

    async fn remove_credential(&self, key: &str) -> Result<(), KeyPoolError> {
        let mut credentials = self.credentials.lock().await;
        let index = credentials
            .iter()
            .position(|c| c.key == key)
            .ok_or_else(|| KeyPoolError::not_found(key))?;
        credentials.remove(index);
        Ok(())
    }

    async fn update_credential(&self, credential: &Credential) -> Result<(), KeyPoolError> {
        let mut credentials = self.credentials.lock().await;
        let slot = credentials
            .iter_mut()
            .find(|c| c.key == credential.key)
            .ok_or_else(|| KeyPoolError::not_found(&credential.key))?;
        *slot = credential.clone();
        Ok(())
    }
}

/// A live key pool kept in sync with a credential store.
pub struct CredentialRegistry {
    pool: Arc<ApiKeyPool>,
    store: Arc<dyn CredentialStore>,
}

impl CredentialRegistry {
    /// Loads every stored credential into a new pool.
    pub async fn load(store: Arc<dyn CredentialStore>) -> Result<Self, KeyPoolError> {
        let credentials = store.list_credentials().await?;
        info!(count = credentials.len(), "Loaded credentials from store");
        Ok(Self {
            pool: Arc::new(ApiKeyPool::new(credentials)),
            store,
        })
    }

    /// Wraps an existing pool and store.
    pub fn new(pool: Arc<ApiKeyPool>, store: Arc<dyn CredentialStore>) -> Self {
        Self { pool, store }
    }

    /// The live pool.
    pub fn pool(&self) -> &Arc<ApiKeyPool> {
        &self.pool
    }

    /// Adds a credential to the pool and the store.
    pub async fn add(
        &self,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Credential, KeyPoolError> {
        let credential = self.pool.add(key, name)?;
        if let Err(e) = self.store.add_credential(&credential).await {
            error!(name = %credential.name, error = %e, "Store rejected new credential, rolling back");
            if self.pool.discard(&credential.key).is_none() {
                error!(name = %credential.name, "Credential vanished before rollback");
            }
            return Err(e);
        }
        Ok(credential)
    }

    /// Removes a credential from the pool and the store.
    pub async fn remove(&self, key: &str) -> Result<Credential, KeyPoolError> {
        let removed = self.pool.remove(key)?;
        if let Err(e) = self.store.remove_credential(key).await {
            error!(name = %removed.name, error = %e, "Store failed to remove credential, rolling back");
            self.pool.restore(removed);
            return Err(e);
        }
        Ok(removed)
    }

    /// Toggles a credential in the pool and persists the new state.
    pub async fn toggle(&self, key: &str) -> Result<bool, KeyPoolError> {
        let active = self.pool.toggle(key)?;
        let updated = self
            .pool
            .credentials()
            .into_iter()
            .find(|c| c.key == key)
            .ok_or_else(|| KeyPoolError::not_found(key))?;

        if let Err(e) = self.store.update_credential(&updated).await {
            error!(name = %updated.name, error = %e, "Store failed to persist toggle, rolling back");
            if !self.pool.set_active(key, !active) {
                error!(name = %updated.name, "Credential vanished before rollback");
            }
            return Err(e);
        }
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn list_credentials(&self) -> Result<Vec<Credential>, KeyPoolError> {
            Ok(Vec::new())
        }

        async fn add_credential(&self, _credential: &Credential) -> Result<(), KeyPoolError> {
            Err(KeyPoolError::store("disk full"))
        }

        async fn remove_credential(&self, _key: &str) -> Result<(), KeyPoolError> {
            Err(KeyPoolError::store("disk full"))
        }
    }

    #[tokio::test]
    async fn test_registry_mirrors_admin_operations() {
        let store = Arc::new(MemoryCredentialStore::new(vec![Credential::new(
            "KEY-DEFAULT-000001",
            "default",
        )
        .as_default()]));
        let registry = CredentialRegistry::load(store.clone()).await.unwrap();

        registry.add("KEY-EXTRA-0000001", "extra").await.unwrap();
        assert_eq!(store.list_credentials().await.unwrap().len(), 2);

        assert_eq!(registry.toggle("KEY-EXTRA-0000001").await, Ok(false));
        let stored = store.list_credentials().await.unwrap();
        assert!(!stored.iter().find(|c| c.name == "extra").unwrap().active);

        registry.remove("KEY-EXTRA-0000001").await.unwrap();
        assert_eq!(store.list_credentials().await.unwrap().len(), 1);
        assert_eq!(registry.pool().credentials().len(), 1);
    }

    #[tokio::test]
    async fn test_registry_rolls_back_on_store_failure() {
        let pool = Arc::new(ApiKeyPool::new(vec![
            Credential::new("KEY-FIRST-0000001", "first"),
            Credential::new("KEY-SECOND-000002", "second"),
        ]));
        let registry = CredentialRegistry::new(pool.clone(), Arc::new(FailingStore));

        assert!(registry.add("KEY-THIRD-0000003", "third").await.is_err());
        assert_eq!(pool.credentials().len(), 2);

        assert!(registry.remove("KEY-SECOND-000002").await.is_err());
        assert_eq!(pool.credentials().len(), 2);

        assert!(registry.toggle("KEY-SECOND-000002").await.is_err());
        assert_eq!(pool.active_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_add_leaves_pool_empty() {
        let pool = Arc::new(ApiKeyPool::new(Vec::new()));
        let registry = CredentialRegistry::new(pool.clone(), Arc::new(FailingStore));

        assert!(matches!(
            registry.add("KEY-FIRST-0000001", "first").await,
            Err(KeyPoolError::Store { .. })
        ));
        assert!(pool.credentials().is_empty());
        assert_eq!(pool.active_count(), 0);
        assert_eq!(*pool.subscribe_active_count().borrow(), 0);
    }

    #[tokio::test]
    async fn test_failed_enable_of_protected_key_is_undone() {
        let pool = Arc::new(ApiKeyPool::new(vec![
            Credential::new("KEY-PROTECTED-0001", "guarded")
                .as_protected()
                .with_active(false),
            Credential::new("KEY-REGULAR-000002", "regular").with_priority(1),
        ]));
        let registry = CredentialRegistry::new(pool.clone(), Arc::new(FailingStore));

        assert!(registry.toggle("KEY-PROTECTED-0001").await.is_err());
        assert_eq!(pool.active_count(), 1);
        assert!(!pool.credentials()[0].active);
    }

    #[tokio::test]
    async fn test_rejected_removal_never_touches_store() {
        let store = Arc::new(MemoryCredentialStore::new(vec![Credential::new(
            "KEY-ONLY-00000001",
            "only",
        )]));
        let registry = CredentialRegistry::load(store.clone()).await.unwrap();

        assert!(matches!(
            registry.remove("KEY-ONLY-00000001").await,
            Err(KeyPoolError::LastCredential { .. })
        ));
        assert_eq!(store.list_credentials().await.unwrap().len(), 1);
    }
}
