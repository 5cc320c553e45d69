// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Trading-day block ranges.
//!
//! This module provides functionality for:
//! - Resolving a calendar date into a closed block interval
//! - Telling a fully elapsed day from the day in progress
//! - Caching completed ranges

pub mod cache;
mod range;

pub use cache::{BlockRangeCache, CacheKey, CacheStats, MemoryCache, NoOpCache};
pub use range::{BlockRange, BlockRangeResolver};
