//! Error types for the alphascan library.
//!
//! This module provides strongly-typed errors for all public APIs in alphascan.
//! It follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained error handling (`BlockRangeError`,
//!   `FetchError`, etc.)
//! - **Unified error type** (`AlphascanError`) for convenience when you don't need
//!   to distinguish between error sources
//!
//! # Architecture
//!
//! Each major module has its own error type:
//! - [`ApiError`] - Upstream chain-data API failures (shared by every module that calls out)
//! - [`KeyPoolError`] - Rejected credential administration
//! - [`BlockRangeError`] - Errors from resolving a date into a block range
//! - [`FetchError`] - Errors from paging through transfers and balances
//! - [`ConfigError`] - Incomplete or undecodable configuration
//! - [`ValidationError`] - Malformed wallet addresses and dates
//! - [`RevenueError`] - Errors from per-wallet and batch revenue analysis
//!
//! # Examples
//!
//! ```rust,ignore
//! use alphascan::{AlphascanError, RevenueOrchestrator};
//!
//! async fn example(orchestrator: &RevenueOrchestrator) -> Result<(), AlphascanError> {
//!     let date = alphascan::parse_query_date("2025-06-01")?;
//!     let snapshots = orchestrator.analyze_batch(&wallets, date).await?;
//!     // Errors automatically convert to AlphascanError via From implementations
//!     Ok(())
//! }
//! ```

mod api;
mod blocks;
mod config;
mod fetch;
mod keys;
mod revenue;
mod validation;

pub use api::ApiError;
pub use blocks::BlockRangeError;
pub use config::ConfigError;
pub use fetch::FetchError;
pub use keys::KeyPoolError;
pub(crate) use keys::mask_key;
pub use revenue::RevenueError;
pub use validation::ValidationError;

/// Unified error type for all alphascan operations.
///
/// All module-specific error types automatically convert to `AlphascanError` via
/// `From` implementations, so you can use `?` to propagate errors naturally.
#[derive(Debug, thiserror::Error)]
pub enum AlphascanError {
    /// Error from the upstream API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Error from credential administration.
    #[error("Key pool error: {0}")]
    KeyPool(#[from] KeyPoolError),

    /// Error from block range resolution.
    #[error("Block range error: {0}")]
    BlockRange(#[from] BlockRangeError),

    /// Error from transfer retrieval.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from input validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error from revenue analysis.
    #[error("Revenue analysis error: {0}")]
    Revenue(#[from] RevenueError),
}
