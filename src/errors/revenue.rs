//! Error types for revenue analysis batches.

use super::{ApiError, BlockRangeError, ConfigError, FetchError, ValidationError};

/// Errors that can occur while analyzing a wallet or a batch of wallets.
///
/// Only [`RevenueError::Config`] escapes a batch. Every other variant is caught
/// per wallet and rendered into that wallet's snapshot.
#[derive(Debug, thiserror::Error)]
pub enum RevenueError {
    /// The batch configuration is incomplete.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed wallet address or date.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The shared block range could not be resolved.
    #[error("Block range error: {0}")]
    BlockRange(#[from] BlockRangeError),

    /// Transfers or balances could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A shared price lookup failed.
    #[error("Price lookup failed for {asset}: {source}")]
    PriceLookup {
        /// Asset whose price failed
        asset: String,
        /// The underlying upstream error
        #[source]
        source: ApiError,
    },

    /// A shared stage of the batch failed, so no wallet could be analyzed.
    #[error("Shared batch stage failed: {details}")]
    SharedStage {
        /// Rendered message of the shared failure
        details: String,
    },
}

impl RevenueError {
    /// Create a `PriceLookup` error.
    pub fn price_lookup(asset: impl Into<String>, source: ApiError) -> Self {
        RevenueError::PriceLookup {
            asset: asset.into(),
            source,
        }
    }

    /// Create a `SharedStage` error from a rendered message.
    pub fn shared_stage(details: impl Into<String>) -> Self {
        RevenueError::SharedStage {
            details: details.into(),
        }
    }
}
