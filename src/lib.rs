// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Wallet revenue analysis for promotional trading programs on EVM chains.
//!
//! For a set of wallets and a trading day, alphascan pulls token transfers from a
//! chain-data API, rebuilds the swaps they form, discovers token prices from those
//! swaps, and reports trading loss, gas loss, valid volume and estimated points
//! per wallet.
//!
//! # Pipeline
//!
//! 1. [`BlockRangeResolver`] turns a date into the blocks of that trading day
//! 2. [`TransactionFetcher`] pages through each wallet's transfers of tracked tokens
//! 3. [`exchange::reconstruct`] groups transfers by transaction into swaps
//! 4. [`price::discover`] derives USD prices greedily, in time order
//! 5. [`revenue::loss::compute`] and [`PointsConfig`] produce the figures
//!
//! [`RevenueOrchestrator`] runs the whole pipeline for a batch, with wallet
//! concurrency bounded by the healthy keys in the [`ApiKeyPool`].
//!
//! Upstream calls go through [`UpstreamClient`]: key rotation, per-key pacing via
//! [`KeyedRateLimiter`], and retry with backoff.

pub mod blocks;
pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod keys;
pub mod price;
pub mod revenue;
pub mod source;
mod tracing;
pub mod transfers;
pub mod transport;
pub mod types;

pub use blocks::{BlockRange, BlockRangeCache, BlockRangeResolver, MemoryCache, NoOpCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AlphascanConfig, AlphascanConfigBuilder, ApiEndpoint, ApiFlavor, NetworkConfig,
    NetworkConfigDocument, TrackedToken, TradingDayBoundary, TradingPair,
};
pub use errors::{
    AlphascanError, ApiError, BlockRangeError, ConfigError, FetchError, KeyPoolError,
    RevenueError, ValidationError,
};
pub use exchange::ExchangeTransaction;
pub use keys::{
    ApiKeyPool, Credential, CredentialHealth, CredentialRegistry, CredentialStore,
    MemoryCredentialStore,
};
pub use price::{PriceDiscovery, PriceInconsistency, PriceMap};
pub use revenue::{
    parse_query_date, parse_wallet, BalanceTier, LossSummary, PointsConfig, PointsEstimate,
    PromotionWindow, RevenueOrchestrator, SnapshotOutcome, TransactionSummary,
    WalletRevenueSnapshot,
};
pub use source::{ChainDataSource, ExplorerApi, IndexerApi};
pub use transfers::{RawTransferEvent, TransactionFetcher};
pub use transport::{KeyedRateLimiter, RetryPolicy, UpstreamClient};
pub use types::decimals::TokenDecimals;
pub use types::wei::WeiAmount;
