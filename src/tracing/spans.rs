//! Span creation helpers for alphascan operations.
//!
//! Telemetry is kept apart from business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here, and the
//! operation attaches it to its future.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(span)
//!     .await
//! }
//! ```

use alloy_chains::NamedChain;
use alloy_primitives::{Address, BlockNumber};
use chrono::NaiveDate;
use tracing::{Level, Span};

use crate::source::Closest;

/// Create span for resolving a calendar date into a block range.
///
/// Children: lookup_block spans
#[inline]
pub(crate) fn resolve_block_range(chain: NamedChain, date: NaiveDate) -> Span {
    tracing::span!(
        Level::INFO,
        "alphascan.resolve_block_range",
        chain_id = %chain,
        date = %date,
    )
}

/// Create span for one timestamp-to-block lookup (all retry attempts).
///
/// Parent: resolve_block_range span
#[inline]
pub(crate) fn lookup_block(timestamp: i64, closest: Closest) -> Span {
    tracing::debug_span!(
        "alphascan.lookup_block",
        timestamp,
        closest = closest.as_str(),
    )
}

/// Create span for paging through one token's transfers.
///
/// Parent: fetch_wallet_transfers span
/// Children: upstream_call spans (one per page)
#[inline]
pub(crate) fn fetch_transfers(
    wallet: Address,
    token: Address,
    from_block: BlockNumber,
    to_block: BlockNumber,
) -> Span {
    tracing::debug_span!(
        "alphascan.fetch_transfers",
        wallet = %wallet,
        token = %token,
        from_block,
        to_block,
    )
}

/// Create span for fetching every tracked token's transfers of a wallet.
///
/// Parent: analyze_wallet span
/// Children: fetch_transfers spans
#[inline]
pub(crate) fn fetch_wallet_transfers(wallet: Address, token_count: usize) -> Span {
    tracing::span!(
        Level::INFO,
        "alphascan.fetch_wallet_transfers",
        wallet = %wallet,
        token_count,
    )
}

/// Create span for seeding the batch price map.
///
/// Parent: analyze_batch span
#[inline]
pub(crate) fn seed_prices(chain: NamedChain) -> Span {
    tracing::debug_span!("alphascan.seed_prices", chain_id = %chain)
}

/// Create span for analyzing one wallet.
///
/// Parent: analyze_batch span (when run as part of a batch)
#[inline]
pub(crate) fn analyze_wallet(chain: NamedChain, wallet: Address, date: NaiveDate) -> Span {
    tracing::span!(
        Level::INFO,
        "alphascan.analyze_wallet",
        chain_id = %chain,
        wallet = %wallet,
        date = %date,
    )
}

/// Create span for one batch session.
///
/// Children: resolve_block_range, seed_prices and analyze_wallet spans
#[inline]
pub(crate) fn analyze_batch(chain: NamedChain, date: NaiveDate, wallet_count: usize) -> Span {
    tracing::span!(
        Level::INFO,
        "alphascan.analyze_batch",
        chain_id = %chain,
        date = %date,
        wallet_count,
        concurrency = tracing::field::Empty,
    )
}
