// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache backends for resolved block ranges.
//!
//! Only completed ranges are ever inserted: a day in progress keeps moving its
//! end block, so it is resolved again on every call.
//!
//! - [`MemoryCache`]: in-memory cache with an optional size limit (default)
//! - [`NoOpCache`]: disables caching entirely

use std::collections::HashMap;
use std::fmt;

use alloy_chains::NamedChain;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::range::BlockRange;

/// Key for caching block ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub(crate) chain: NamedChain,
    pub(crate) date: NaiveDate,
}

impl CacheKey {
    /// Creates a new cache key for a specific chain and date
    pub fn new(chain: NamedChain, date: NaiveDate) -> Self {
        Self { chain, date }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain as u64, self.date)
    }
}

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries evicted due to size limits
    pub evictions: u64,
    /// Current number of entries in the cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, evictions={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.evictions,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Trait for block range cache backends
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait BlockRangeCache: Send + Sync {
    /// Retrieves a cached range, or `None` on a miss.
    async fn get(&self, key: &CacheKey) -> Option<BlockRange>;

    /// Inserts a range, possibly evicting the least recently used entry.
    async fn insert(&self, key: CacheKey, range: BlockRange);

    /// Removes every entry.
    async fn clear(&self);

    /// Returns current cache statistics
    async fn stats(&self) -> CacheStats;

    /// Returns a human-readable name for this cache backend
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    range: BlockRange,
    /// Sequence number of the last access, for LRU eviction
    access_seq: u64,
}

#[derive(Debug, Default)]
struct MemoryCacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    next_seq: u64,
}

impl MemoryCacheState {
    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }
}

/// In-memory cache with an optional size limit.
///
/// When the limit is reached the least recently used range is evicted.
///
/// # Examples
///
/// ```rust
/// use alphascan::blocks::MemoryCache;
///
/// let unbounded = MemoryCache::new();
/// let bounded = MemoryCache::new().with_max_entries(365);
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    max_entries: Option<usize>,
    state: Mutex<MemoryCacheState>,
}

impl MemoryCache {
    /// Creates a new memory cache with no limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries in the cache
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    fn evict_lru(state: &mut MemoryCacheState) {
        let lru_key = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.access_seq)
            .map(|(key, _)| *key);

        if let Some(key) = lru_key {
            debug!(key = %key, "Evicting LRU cache entry");
            state.entries.remove(&key);
            state.stats.evictions += 1;
        }
    }
}

#[async_trait]
impl BlockRangeCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<BlockRange> {
        let mut state = self.state.lock().await;
        let seq = state.bump();

        let found = state.entries.get_mut(key).map(|entry| {
            entry.access_seq = seq;
            entry.range.clone()
        });
        if found.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        found
    }

    async fn insert(&self, key: CacheKey, range: BlockRange) {
        let mut state = self.state.lock().await;

        if let Some(max) = self.max_entries {
            if max == 0 {
                return;
            }
            if !state.entries.contains_key(&key) && state.entries.len() >= max {
                Self::evict_lru(&mut state);
            }
        }

        let access_seq = state.bump();
        state.entries.insert(key, CacheEntry { range, access_seq });
        state.stats.entries = state.entries.len();
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.stats.entries = 0;
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// A cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

#[async_trait]
impl BlockRangeCache for NoOpCache {
    async fn get(&self, _key: &CacheKey) -> Option<BlockRange> {
        None
    }

    async fn insert(&self, _key: CacheKey, _range: BlockRange) {}

    async fn clear(&self) {}

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
