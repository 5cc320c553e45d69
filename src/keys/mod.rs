// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! API credential management.
//!
//! - [`ApiKeyPool`]: round-robin selection with health tracking and safe administration
//! - [`CredentialStore`]: persistence seam, with an in-memory implementation
//! - [`CredentialRegistry`]: keeps a live pool and a store in sync

mod pool;
mod store;

pub use pool::{
    ApiKeyPool, Credential, CredentialHealth, SelectedCredential, UNHEALTHY_AFTER_ERRORS,
};
pub use store::{CredentialRegistry, CredentialStore, MemoryCredentialStore};
