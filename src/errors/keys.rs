// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for API credential management.

/// Errors returned by credential administration on the key pool.
///
/// Every rejected operation leaves the credential set unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyPoolError {
    /// A credential with the same key value is already registered.
    #[error("Credential {name} is already registered")]
    DuplicateKey {
        /// Display name of the existing credential
        name: String,
    },

    /// No credential matches the given key value.
    #[error("Credential not found: {key}")]
    NotFound {
        /// Masked key value
        key: String,
    },

    /// The credential is protected (or the default) and cannot be removed or disabled.
    #[error("Credential {name} is protected")]
    Protected {
        /// Display name of the protected credential
        name: String,
    },

    /// The operation would leave the pool without any credential.
    #[error("Cannot remove the last remaining credential {name}")]
    LastCredential {
        /// Display name of the credential
        name: String,
    },

    /// The operation would leave the pool without an active credential.
    #[error("Cannot deactivate the last active credential {name}")]
    LastActiveCredential {
        /// Display name of the credential
        name: String,
    },

    /// The key value is empty.
    #[error("Credential key must not be empty")]
    EmptyKey,

    /// The credential store failed.
    #[error("Credential store error: {details}")]
    Store {
        /// Details about the store failure
        details: String,
    },
}

impl KeyPoolError {
    /// Create a `NotFound` error, masking the key value.
    pub fn not_found(key: &str) -> Self {
        KeyPoolError::NotFound {
            key: mask_key(key),
        }
    }

    /// Create a `Store` error with details.
    pub fn store(details: impl Into<String>) -> Self {
        KeyPoolError::Store {
            details: details.into(),
        }
    }
}

/// Masks an API key for logs and error messages, keeping the first and last four characters.
pub(crate) fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("ABCDEFGHIJKLMNOP"), "ABCD...MNOP");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_not_found_masks_key() {
        let error = KeyPoolError::not_found("ABCDEFGHIJKLMNOP");
        assert_eq!(error.to_string(), "Credential not found: ABCD...MNOP");
    }
}
