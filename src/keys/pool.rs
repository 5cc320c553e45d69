// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Round-robin API credential pool with per-credential health tracking.
//!
//! The pool rotates requests across the active credentials of one upstream service,
//! skipping credentials that failed repeatedly, and supports runtime administration
//! (add, remove, enable/disable) under a set of safety rules:
//!
//! - duplicate key values are rejected
//! - default and protected credentials can never be removed or deactivated
//! - the last credential and the last active credential can never be removed or
//!   deactivated
//!
//! The number of active credentials is published on a [`watch`] channel so that the
//! [`KeyedRateLimiter`](crate::transport::KeyedRateLimiter) can rescale its dispatch
//! interval whenever an administrator toggles a key.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::{mask_key, KeyPoolError};

/// Consecutive failures after which a credential is considered unhealthy.
pub const UNHEALTHY_AFTER_ERRORS: u32 = 3;

/// Weight of the previous average in the response-time moving average.
const RESPONSE_TIME_DECAY: f64 = 0.8;

/// An API credential for the upstream chain-data service.
///
/// `Debug` output masks the key value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Secret key value, unique within a pool
    pub key: String,
    /// Human-readable name
    pub name: String,
    /// Inactive credentials are never selected
    #[serde(default = "default_active")]
    pub active: bool,
    /// Rotation order (ascending)
    #[serde(default)]
    pub priority: u32,
    /// The network's default credential
    #[serde(default)]
    pub is_default: bool,
    /// Protected credentials cannot be removed or deactivated
    #[serde(default)]
    pub protected: bool,
}

fn default_active() -> bool {
    true
}

impl Credential {
    /// Creates an active, unprotected credential with priority 0.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            active: true,
            priority: 0,
            is_default: false,
            protected: false,
        }
    }

    /// Sets the rotation priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the credential as the network default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Marks the credential as protected.
    pub fn as_protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    fn is_locked(&self) -> bool {
        self.protected || self.is_default
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &mask_key(&self.key))
            .field("name", &self.name)
            .field("active", &self.active)
            .field("priority", &self.priority)
            .field("is_default", &self.is_default)
            .field("protected", &self.protected)
            .finish()
    }
}

/// Health record kept for each credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialHealth {
    /// Last time the credential was selected or reported on
    pub last_used: Option<DateTime<Utc>>,
    /// Consecutive error count (decremented by successes, floor 0)
    pub error_count: u32,
    /// Exponential moving average of response times in milliseconds
    pub avg_response_ms: Option<f64>,
    /// `error_count < 3`
    pub healthy: bool,
}

impl Default for CredentialHealth {
    fn default() -> Self {
        Self {
            last_used: None,
            error_count: 0,
            avg_response_ms: None,
            healthy: true,
        }
    }
}

impl CredentialHealth {
    fn record_success(&mut self, elapsed: Duration) {
        let sample = elapsed.as_secs_f64() * 1000.0;
        self.avg_response_ms = Some(match self.avg_response_ms {
            Some(avg) => RESPONSE_TIME_DECAY * avg + (1.0 - RESPONSE_TIME_DECAY) * sample,
            None => sample,
        });
        self.error_count = self.error_count.saturating_sub(1);
        self.healthy = true;
        self.last_used = Some(Utc::now());
    }

    fn record_failure(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
        self.healthy = self.error_count < UNHEALTHY_AFTER_ERRORS;
        self.last_used = Some(Utc::now());
    }
}

/// A credential handed out by [`ApiKeyPool::next`].
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedCredential {
    /// Position of the credential in the pool at selection time
    pub index: usize,
    /// Secret key value
    pub key: String,
    /// Human-readable name
    pub name: String,
}

impl SelectedCredential {
    /// Key value safe for logs.
    pub fn masked_key(&self) -> String {
        mask_key(&self.key)
    }
}

impl fmt::Debug for SelectedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedCredential")
            .field("index", &self.index)
            .field("key", &self.masked_key())
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Default)]
struct PoolState {
    credentials: Vec<Credential>,
    health: Vec<CredentialHealth>,
    cursor: usize,
}

impl PoolState {
    fn position(&self, key: &str) -> Option<usize> {
        self.credentials.iter().position(|c| c.key == key)
    }

    fn active_count(&self) -> usize {
        self.credentials.iter().filter(|c| c.active).count()
    }

    /// Indices of active credentials in rotation order (priority, then insertion).
    fn rotation(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.credentials.len())
            .filter(|&i| self.credentials[i].active)
            .collect();
        order.sort_by_key(|&i| self.credentials[i].priority);
        order
    }
}

/// Thread-safe credential pool for one upstream service.
///
/// # Examples
///
/// ```rust
/// use alphascan::{ApiKeyPool, Credential};
///
/// let pool = ApiKeyPool::new(vec![
///     Credential::new("KEY-ONE-0000000001", "primary").with_priority(0),
///     Credential::new("KEY-TWO-0000000002", "secondary").with_priority(1),
/// ]);
///
/// let first = pool.next().unwrap();
/// let second = pool.next().unwrap();
/// assert_ne!(first.key, second.key);
/// ```
#[derive(Debug)]
pub struct ApiKeyPool {
    state: RwLock<PoolState>,
    active_count: watch::Sender<usize>,
}

impl ApiKeyPool {
    /// Creates a pool from the configured credentials.
    ///
    /// Credentials with an empty key, or whose key repeats an earlier one, are skipped.
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let mut state = PoolState::default();
        for credential in credentials {
            if credential.key.is_empty() {
                warn!(name = %credential.name, "Skipping credential with empty key");
                continue;
            }
            if state.position(&credential.key).is_some() {
                warn!(name = %credential.name, "Skipping duplicate credential");
                continue;
            }
            state.credentials.push(credential);
            state.health.push(CredentialHealth::default());
        }

        let (active_count, _) = watch::channel(state.active_count());
        Self {
            state: RwLock::new(state),
            active_count,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PoolState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_active_count(&self, count: usize) {
        self.active_count.send_replace(count);
    }

    /// Selects the next credential to use.
    ///
    /// Starting at the rotation cursor, returns the first healthy active credential.
    /// The cursor always advances by exactly one. When every active credential is
    /// unhealthy the first active credential is returned anyway. Returns `None` only
    /// when no credential is active.
    pub fn next(&self) -> Option<SelectedCredential> {
        let mut state = self.write();
        let rotation = state.rotation();
        if rotation.is_empty() {
            return None;
        }

        let start = state.cursor % rotation.len();
        state.cursor = state.cursor.wrapping_add(1);

        let index = (0..rotation.len())
            .map(|offset| rotation[(start + offset) % rotation.len()])
            .find(|&i| state.health[i].healthy)
            .unwrap_or_else(|| {
                debug!("No healthy credential available, falling back to the first active one");
                rotation[0]
            });

        state.health[index].last_used = Some(Utc::now());
        let credential = &state.credentials[index];
        Some(SelectedCredential {
            index,
            key: credential.key.clone(),
            name: credential.name.clone(),
        })
    }

    /// Records a successful call made with the credential whose key is `key`.
    ///
    /// Outcomes are matched by key, so a credential removed or shifted while the
    /// call was in flight never has its outcome credited to another one.
    pub fn record_success(&self, key: &str, elapsed: Duration) {
        let mut state = self.write();
        if let Some(index) = state.position(key) {
            state.health[index].record_success(elapsed);
        }
    }

    /// Records a failed call made with the credential whose key is `key`.
    pub fn record_failure(&self, key: &str) {
        let mut state = self.write();
        let Some(index) = state.position(key) else {
            return;
        };
        let health = &mut state.health[index];
        health.record_failure();
        if !health.healthy {
            let error_count = health.error_count;
            warn!(
                name = %state.credentials[index].name,
                error_count,
                "Credential marked unhealthy"
            );
        }
    }

    /// Registers a new active credential with priority one above the current maximum.
    pub fn add(
        &self,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Credential, KeyPoolError> {
        let key = key.into();
        if key.is_empty() {
            return Err(KeyPoolError::EmptyKey);
        }

        let mut state = self.write();
        if let Some(existing) = state.position(&key) {
            return Err(KeyPoolError::DuplicateKey {
                name: state.credentials[existing].name.clone(),
            });
        }

        let priority = state
            .credentials
            .iter()
            .map(|c| c.priority)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        let credential = Credential::new(key, name).with_priority(priority);

        state.credentials.push(credential.clone());
        state.health.push(CredentialHealth::default());
        let active = state.active_count();
        drop(state);

        info!(name = %credential.name, priority, "Credential added");
        self.publish_active_count(active);
        Ok(credential)
    }

    /// Removes the credential with the given key value.
    pub fn remove(&self, key: &str) -> Result<Credential, KeyPoolError> {
        let mut state = self.write();
        let index = state
            .position(key)
            .ok_or_else(|| KeyPoolError::not_found(key))?;

        let credential = &state.credentials[index];
        if credential.is_locked() {
            return Err(KeyPoolError::Protected {
                name: credential.name.clone(),
            });
        }
        if state.credentials.len() == 1 {
            return Err(KeyPoolError::LastCredential {
                name: credential.name.clone(),
            });
        }
        if credential.active && state.active_count() == 1 {
            return Err(KeyPoolError::LastActiveCredential {
                name: credential.name.clone(),
            });
        }

        let removed = state.credentials.remove(index);
        state.health.remove(index);
        let active = state.active_count();
        drop(state);

        info!(name = %removed.name, "Credential removed");
        self.publish_active_count(active);
        Ok(removed)
    }

    /// Flips the active flag of the credential with the given key value.
    ///
    /// Returns the new active state. Enabling is always allowed.
    pub fn toggle(&self, key: &str) -> Result<bool, KeyPoolError> {
        let mut state = self.write();
        let index = state
            .position(key)
            .ok_or_else(|| KeyPoolError::not_found(key))?;

        let active_count = state.active_count();
        let credential = &mut state.credentials[index];
        if credential.active {
            if active_count == 1 {
                return Err(KeyPoolError::LastActiveCredential {
                    name: credential.name.clone(),
                });
            }
            if credential.is_locked() {
                return Err(KeyPoolError::Protected {
                    name: credential.name.clone(),
                });
            }
        }

        credential.active = !credential.active;
        let now_active = credential.active;
        let name = credential.name.clone();
        let active = state.active_count();
        drop(state);

        info!(name = %name, active = now_active, "Credential toggled");
        self.publish_active_count(active);
        Ok(now_active)
    }

    /// Puts back a credential removed by [`remove`](Self::remove), with fresh health.
    pub(crate) fn restore(&self, credential: Credential) {
        let mut state = self.write();
        if state.position(&credential.key).is_some() {
            return;
        }
        state.credentials.push(credential);
        state.health.push(CredentialHealth::default());
        let active = state.active_count();
        drop(state);
        self.publish_active_count(active);
    }

    /// Drops the credential with the given key value, bypassing the admin guards.
    ///
    /// Undoes an [`add`](Self::add) whose persistence failed.
    pub(crate) fn discard(&self, key: &str) -> Option<Credential> {
        let mut state = self.write();
        let index = state.position(key)?;
        let removed = state.credentials.remove(index);
        state.health.remove(index);
        let active = state.active_count();
        drop(state);
        self.publish_active_count(active);
        Some(removed)
    }

    /// Sets the active flag of the credential with the given key value, bypassing
    /// the admin guards. Returns `false` if no such credential exists.
    ///
    /// Undoes a [`toggle`](Self::toggle) whose persistence failed.
    pub(crate) fn set_active(&self, key: &str, active: bool) -> bool {
        let mut state = self.write();
        let Some(index) = state.position(key) else {
            return false;
        };
        state.credentials[index].active = active;
        let count = state.active_count();
        drop(state);
        self.publish_active_count(count);
        true
    }

    /// Snapshot of all credentials in insertion order.
    pub fn credentials(&self) -> Vec<Credential> {
        self.read().credentials.clone()
    }

    /// Snapshot of all health records, aligned with [`credentials`](Self::credentials).
    pub fn health(&self) -> Vec<CredentialHealth> {
        self.read().health.clone()
    }

    /// Number of active credentials.
    pub fn active_count(&self) -> usize {
        self.read().active_count()
    }

    /// Number of credentials that are both active and healthy.
    pub fn healthy_active_count(&self) -> usize {
        let state = self.read();
        state
            .credentials
            .iter()
            .zip(&state.health)
            .filter(|(credential, health)| credential.active && health.healthy)
            .count()
    }

    /// Subscribes to changes of the active credential count.
    pub fn subscribe_active_count(&self) -> watch::Receiver<usize> {
        self.active_count.subscribe()
    }
}
