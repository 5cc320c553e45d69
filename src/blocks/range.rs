// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use alloy_chains::NamedChain;
use alloy_primitives::BlockNumber;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};

use super::cache::{BlockRangeCache, CacheKey, CacheStats, MemoryCache, NoOpCache};
use crate::clock::{Clock, SystemClock};
use crate::config::TradingDayBoundary;
use crate::errors::{ApiError, BlockRangeError, ValidationError};
use crate::source::{ChainDataSource, Closest};
use crate::tracing::spans;
use crate::transport::{retry_with, RetryPolicy};

/// Closed block interval covering one trading day on one chain.
///
/// A completed range ends at the last block of the day. A range for the day in
/// progress ends one block before the latest block seen at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// Chain the blocks belong to
    pub chain: NamedChain,
    /// Trading day covered
    pub date: NaiveDate,
    /// First block of the day (inclusive)
    pub start_block: BlockNumber,
    /// Last block included (inclusive)
    pub end_block: BlockNumber,
    /// UNIX timestamp of the start of the trading day
    pub start_timestamp: i64,
    /// UNIX timestamp of the last second covered: the end of the day, or the
    /// resolution time for a day in progress
    pub end_timestamp: i64,
    /// Whether the trading day had fully elapsed when the range was resolved
    pub is_completed: bool,
}

impl BlockRange {
    /// Number of blocks in the range (inclusive).
    pub fn block_count(&self) -> u64 {
        self.end_block
            .saturating_sub(self.start_block)
            .saturating_add(1)
    }
}

/// Converts calendar dates into block ranges through a [`ChainDataSource`].
///
/// # Examples
///
/// ```rust,ignore
/// use alphascan::{BlockRangeResolver, TradingDayBoundary};
/// use alloy_chains::NamedChain;
///
/// let resolver = BlockRangeResolver::new(source, TradingDayBoundary::UTC_MIDNIGHT);
/// let range = resolver.resolve(date, NamedChain::BinanceSmartChain).await?;
/// println!("Blocks: {}..={}", range.start_block, range.end_block);
/// ```
pub struct BlockRangeResolver {
    source: Arc<dyn ChainDataSource>,
    boundary: TradingDayBoundary,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    cache: Box<dyn BlockRangeCache>,
}

impl BlockRangeResolver {
    /// Creates a resolver with an in-memory cache, the system clock and the
    /// block-lookup retry policy (3 attempts, `attempt x 1s`).
    pub fn new(source: Arc<dyn ChainDataSource>, boundary: TradingDayBoundary) -> Self {
        Self {
            source,
            boundary,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::block_lookup(),
            cache: Box::new(MemoryCache::new()),
        }
    }

    /// Replaces the clock used for "has the day elapsed" checks and backoff.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the retry policy of block lookups.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the cache backend.
    pub fn with_cache(mut self, cache: Box<dyn BlockRangeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Disables caching.
    pub fn without_cache(self) -> Self {
        self.with_cache(Box::new(NoOpCache))
    }

    /// Returns current cache statistics
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Resolves `date` into a block range on `chain`.
    ///
    /// The start block is the first block at or after the start of the trading
    /// day. If the day has fully elapsed, the end block is the last block at or
    /// before its final second; otherwise it is the latest block minus one and
    /// the range is marked incomplete. Completed ranges are cached.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::FutureDate`] if the trading day has not started yet,
    ///   raised before any upstream call
    /// - [`BlockRangeError::Api`] if a lookup still fails after retries
    pub async fn resolve(
        &self,
        date: NaiveDate,
        chain: NamedChain,
    ) -> Result<BlockRange, BlockRangeError> {
        let span = spans::resolve_block_range(chain, date);
        self.resolve_inner(date, chain).instrument(span).await
    }

    async fn resolve_inner(
        &self,
        date: NaiveDate,
        chain: NamedChain,
    ) -> Result<BlockRange, BlockRangeError> {
        let start = self
            .boundary
            .day_start(date)
            .ok_or_else(|| BlockRangeError::invalid_date_conversion(date))?;
        let next_start = self
            .boundary
            .next_day_start(date)
            .ok_or_else(|| BlockRangeError::date_arithmetic_overflow(date))?;

        let now = self.clock.now();
        if now < start {
            return Err(ValidationError::FutureDate { date }.into());
        }

        let key = CacheKey::new(chain, date);
        if let Some(range) = self.cache.get(&key).await {
            info!(
                chain = %chain,
                date = %date,
                cache = %self.cache.name(),
                cached = true,
                "Retrieved block range from cache"
            );
            return Ok(range);
        }

        let start_timestamp = start.timestamp();
        let day_end_timestamp = next_start.timestamp() - 1;
        let is_completed = now >= next_start;

        let start_block = self.lookup(start_timestamp, Closest::After).await?;

        let (end_block, end_timestamp) = if is_completed {
            let end_block = self.lookup(day_end_timestamp, Closest::Before).await?;
            if end_block < start_block {
                return Err(BlockRangeError::invalid_range(start_block, end_block));
            }
            (end_block, day_end_timestamp)
        } else {
            let latest = self.latest_block().await?;
            let end_block = latest.saturating_sub(1).max(start_block);
            debug!(latest, end_block, "Trading day in progress, ending before latest block");
            (end_block, now.timestamp().min(day_end_timestamp))
        };

        let range = BlockRange {
            chain,
            date,
            start_block,
            end_block,
            start_timestamp,
            end_timestamp,
            is_completed,
        };

        info!(
            chain = %chain,
            date = %date,
            start_block,
            end_block,
            block_count = range.block_count(),
            is_completed,
            "Resolved block range"
        );

        if is_completed {
            self.cache.insert(key, range.clone()).await;
        }
        Ok(range)
    }

    async fn lookup(&self, timestamp: i64, closest: Closest) -> Result<u64, ApiError> {
        let span = spans::lookup_block(timestamp, closest);
        retry_with(
            &self.retry,
            self.clock.as_ref(),
            "block_by_timestamp",
            ApiError::is_retryable,
            |_| self.source.block_by_timestamp(timestamp, closest),
        )
        .instrument(span)
        .await
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        retry_with(
            &self.retry,
            self.clock.as_ref(),
            "latest_block",
            ApiError::is_retryable,
            |_| self.source.latest_block(),
        )
        .await
    }
}
