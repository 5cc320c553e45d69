// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared error types for upstream chain-data API operations.
//!
//! This module provides error types for failures that can occur when talking to
//! the upstream chain-data service, regardless of which API flavor is in use.

/// Errors that can occur during upstream API operations.
///
/// Each variant knows whether it is worth retrying (see [`ApiError::is_retryable`])
/// and whether it should count against the health of the credential that was used
/// (see [`ApiError::counts_against_key`]).
///
/// # Examples
///
/// ```rust
/// use alphascan::ApiError;
///
/// let error = ApiError::data_shape("tokentx", "result is not an array");
/// assert!(error.is_retryable());
/// println!("Error: {}", error);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection failure while sending the request or reading the body.
    #[error("Transport failure during {operation}")]
    Transport {
        /// Description of the operation that failed
        operation: String,
        /// The underlying HTTP client error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The request did not complete within its timeout.
    #[error("Request timed out during {operation}")]
    Timeout {
        /// Description of the operation that timed out
        operation: String,
    },

    /// Non-success HTTP status code.
    #[error("HTTP {status} during {operation}: {body}")]
    Http {
        /// Description of the operation that failed
        operation: String,
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The upstream service throttled the request.
    #[error("Rate limited during {operation}: {message}")]
    RateLimited {
        /// Description of the operation that was throttled
        operation: String,
        /// Message returned by the upstream service
        message: String,
    },

    /// The credential was rejected by the upstream service.
    #[error("Invalid API key during {operation}: {message}")]
    InvalidKey {
        /// Description of the operation that failed
        operation: String,
        /// Message returned by the upstream service
        message: String,
    },

    /// The response did not have the expected structure.
    #[error("Unexpected response shape for {operation}: {details}")]
    DataShape {
        /// Description of the operation whose response was malformed
        operation: String,
        /// Details about what was wrong with the response
        details: String,
    },

    /// The upstream service answered with an explicit failure.
    ///
    /// This is a definite answer (e.g. "Invalid address format") and is not retried.
    #[error("Upstream rejected {operation}: {message}")]
    Rejected {
        /// Description of the operation that was rejected
        operation: String,
        /// Message returned by the upstream service
        message: String,
    },

    /// The capability is not offered by this API flavor.
    #[error("Operation {operation} is not supported by the {flavor} API")]
    Unsupported {
        /// Description of the unsupported operation
        operation: String,
        /// Name of the API flavor
        flavor: String,
    },

    /// No credential is available to sign the request.
    #[error("No active API credentials configured")]
    NoActiveCredentials,
}

impl ApiError {
    /// Helper to create a `Transport` error from any error type.
    pub fn transport(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ApiError::Transport {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Timeout` error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        ApiError::Timeout {
            operation: operation.into(),
        }
    }

    /// Helper to create a `DataShape` error.
    pub fn data_shape(operation: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::DataShape {
            operation: operation.into(),
            details: details.into(),
        }
    }

    /// Helper to create a `Rejected` error.
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Helper to create an `Unsupported` error.
    pub fn unsupported(operation: impl Into<String>, flavor: impl Into<String>) -> Self {
        ApiError::Unsupported {
            operation: operation.into(),
            flavor: flavor.into(),
        }
    }

    /// Returns `true` for failures that may succeed on another attempt.
    ///
    /// Transient network failures, malformed responses, throttling, rejected keys
    /// (the next attempt rotates to another key) and server-side HTTP errors are
    /// retryable. Explicit rejections, unsupported operations, client-side HTTP
    /// errors and missing credentials are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. }
            | ApiError::Timeout { .. }
            | ApiError::DataShape { .. }
            | ApiError::RateLimited { .. }
            | ApiError::InvalidKey { .. } => true,
            ApiError::Http { status, .. } => *status >= 500 || *status == 429,
            ApiError::Rejected { .. }
            | ApiError::Unsupported { .. }
            | ApiError::NoActiveCredentials => false,
        }
    }

    /// Returns `true` if the failure should be recorded against the credential used.
    pub fn counts_against_key(&self) -> bool {
        !matches!(
            self,
            ApiError::Rejected { .. } | ApiError::Unsupported { .. } | ApiError::NoActiveCredentials
        )
    }
}
