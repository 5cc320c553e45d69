//! Error types for block range resolution.
//!
//! This module provides error types for operations in the `blocks` module,
//! particularly for resolving a calendar date into a closed block interval.

use chrono::NaiveDate;

use super::{ApiError, ValidationError};

/// Errors that can occur while resolving a date into a block range.
///
/// # Examples
///
/// ```rust,ignore
/// use alphascan::{BlockRangeResolver, BlockRangeError};
/// use alloy_chains::NamedChain;
/// use chrono::NaiveDate;
///
/// async fn example(resolver: &BlockRangeResolver) {
///     let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
///
///     match resolver.resolve(date, NamedChain::BinanceSmartChain).await {
///         Ok(range) => println!("Blocks: {}..={}", range.start_block, range.end_block),
///         Err(BlockRangeError::Api(e)) => eprintln!("Upstream failure: {}", e),
///         Err(e) => eprintln!("Other error: {}", e),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BlockRangeError {
    /// Invalid block range calculated.
    ///
    /// This occurs when the end block precedes the start block.
    #[error("Invalid block range: {reason}")]
    InvalidRange {
        /// Description of why the range is invalid
        reason: String,
    },

    /// Error related to timestamp calculations.
    ///
    /// This can occur when converting dates to timestamps or when the
    /// trading-day boundary does not map onto a valid instant.
    #[error("Timestamp error: {details}")]
    TimestampError {
        /// Details about the timestamp error
        details: String,
    },

    /// The requested date was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Upstream failure when looking up block numbers.
    #[error("Upstream API error: {0}")]
    Api(#[from] ApiError),
}

impl BlockRangeError {
    /// Create an `InvalidRange` error for reversed block numbers.
    pub fn invalid_range(start_block: u64, end_block: u64) -> Self {
        BlockRangeError::InvalidRange {
            reason: format!("end block {end_block} precedes start block {start_block}"),
        }
    }

    /// Create a `TimestampError` for a date that cannot be converted.
    pub fn invalid_date_conversion(date: NaiveDate) -> Self {
        BlockRangeError::TimestampError {
            details: format!("cannot convert {date} to a trading-day boundary"),
        }
    }

    /// Create a `TimestampError` for date arithmetic overflow.
    pub fn date_arithmetic_overflow(date: NaiveDate) -> Self {
        BlockRangeError::TimestampError {
            details: format!("date arithmetic overflow for {date}"),
        }
    }
}
