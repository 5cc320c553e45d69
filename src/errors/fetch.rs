//! Error types for transfer retrieval.

use alloy_primitives::Address;

use super::ApiError;

/// Errors that can occur while paging through a wallet's token transfers.
///
/// A fetch error is a per-token failure. The orchestrator records it on the
/// affected wallet's snapshot instead of aborting the batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Listing transfers for a token failed.
    #[error("Failed to fetch transfers of token {token} for wallet {wallet} (page {page})")]
    TokenTransfers {
        /// Wallet being analyzed
        wallet: Address,
        /// Token contract queried
        token: Address,
        /// Page that failed (1-based)
        page: u32,
        /// The underlying upstream error
        #[source]
        source: ApiError,
    },

    /// A balance lookup failed.
    #[error("Failed to fetch {asset} balance for wallet {wallet}")]
    Balance {
        /// Wallet being analyzed
        wallet: Address,
        /// Asset description (native symbol or token symbol)
        asset: String,
        /// The underlying upstream error
        #[source]
        source: ApiError,
    },

    /// A transfer record could not be converted.
    #[error("Malformed transfer record: {details}")]
    MalformedTransfer {
        /// Details about the malformed record
        details: String,
    },
}

impl FetchError {
    /// Create a `MalformedTransfer` error.
    pub fn malformed_transfer(details: impl Into<String>) -> Self {
        FetchError::MalformedTransfer {
            details: details.into(),
        }
    }
}
