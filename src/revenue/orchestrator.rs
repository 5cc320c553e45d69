// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::Arc;

use alloy_primitives::Address;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn, Instrument, Span};

use super::input::parse_wallet;
use super::loss;
use super::points::{PointsConfig, PromotionWindow};
use super::snapshot::{TransactionSummary, WalletRevenueSnapshot};
use crate::blocks::{BlockRange, BlockRangeResolver};
use crate::config::{AlphascanConfig, NetworkConfig, TrackedToken};
use crate::errors::{BlockRangeError, ConfigError, RevenueError};
use crate::exchange::{self, ExchangeTransaction};
use crate::keys::ApiKeyPool;
use crate::price::{discover_into, PriceMap};
use crate::source::ChainDataSource;
use crate::tracing::spans;
use crate::transfers::TransactionFetcher;
use crate::types::wei::WeiAmount;

/// State shared by every wallet of one batch.
struct BatchContext {
    range: BlockRange,
    native_price: BigDecimal,
    prices: Mutex<PriceMap>,
}

/// Runs the revenue pipeline for wallets on one network.
///
/// Per batch, the block range and the seed prices are computed once and shared.
/// Wallets are then analyzed in chunks of `min(healthy active keys, wallets)`,
/// each chunk awaited before the next starts. A wallet's failure is recorded on
/// its snapshot and never aborts the batch; only configuration errors and an
/// invalid date do.
///
/// # Examples
///
/// ```rust,ignore
/// use alphascan::{AlphascanConfig, RevenueOrchestrator};
///
/// let orchestrator = RevenueOrchestrator::new(network, source, pool, &AlphascanConfig::default());
/// let snapshots = orchestrator.analyze_batch(&wallets, date).await?;
/// assert_eq!(snapshots.len(), wallets.len());
/// ```
pub struct RevenueOrchestrator {
    network: NetworkConfig,
    source: Arc<dyn ChainDataSource>,
    pool: Arc<ApiKeyPool>,
    resolver: BlockRangeResolver,
    fetcher: TransactionFetcher,
    points: PointsConfig,
}

impl RevenueOrchestrator {
    /// Creates an orchestrator for `network`, reading chain data from `source`.
    ///
    /// `pool` is the key pool behind `source`; its healthy active key count
    /// bounds wallet concurrency.
    pub fn new(
        network: NetworkConfig,
        source: Arc<dyn ChainDataSource>,
        pool: Arc<ApiKeyPool>,
        config: &AlphascanConfig,
    ) -> Self {
        let resolver = BlockRangeResolver::new(source.clone(), network.boundary);
        let fetcher = TransactionFetcher::new(source.clone(), config.page_size);
        Self {
            network,
            source,
            pool,
            resolver,
            fetcher,
            points: config.points.clone(),
        }
    }

    /// Replaces the block range resolver (e.g. to inject a clock or cache).
    pub fn with_resolver(mut self, resolver: BlockRangeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The network this orchestrator analyzes.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Number of wallets analyzed at once for a batch of `wallet_count`.
    pub fn concurrency(&self, wallet_count: usize) -> usize {
        self.pool.healthy_active_count().min(wallet_count).max(1)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        if self.pool.active_count() == 0 {
            return Err(ConfigError::NoActiveCredentials {
                network: self.network.name.clone(),
            });
        }
        Ok(())
    }

    /// Analyzes one wallet.
    ///
    /// A malformed wallet is rejected before any upstream call.
    pub async fn analyze_wallet(
        &self,
        wallet: &str,
        date: NaiveDate,
    ) -> Result<WalletRevenueSnapshot, RevenueError> {
        parse_wallet(wallet)?;
        let mut snapshots = self.analyze_batch(&[wallet.to_string()], date).await?;
        snapshots
            .pop()
            .ok_or_else(|| RevenueError::shared_stage("batch returned no snapshot"))
    }

    /// Analyzes every wallet in `wallets` for trading day `date`.
    ///
    /// The result has one snapshot per input wallet, in input order.
    ///
    /// # Errors
    ///
    /// - [`RevenueError::Config`] if the network configuration is incomplete or
    ///   the key pool has no active credential
    /// - [`RevenueError::Validation`] if `date` has not started yet
    pub async fn analyze_batch(
        &self,
        wallets: &[String],
        date: NaiveDate,
    ) -> Result<Vec<WalletRevenueSnapshot>, RevenueError> {
        let span = spans::analyze_batch(self.network.chain, date, wallets.len());
        self.run_batch(wallets, date).instrument(span).await
    }

    async fn run_batch(
        &self,
        wallets: &[String],
        date: NaiveDate,
    ) -> Result<Vec<WalletRevenueSnapshot>, RevenueError> {
        self.validate()?;
        info!(
            network = %self.network.name,
            date = %date,
            wallets = wallets.len(),
            "Batch session started"
        );
        if wallets.is_empty() {
            return Ok(Vec::new());
        }

        let context = match self.prepare(date).await {
            Ok(context) => context,
            Err(error @ RevenueError::Validation(_)) => return Err(error),
            Err(error) => {
                warn!(error = %error, "Shared batch stage failed, no wallet can be analyzed");
                let message = RevenueError::shared_stage(error.to_string()).to_string();
                return Ok(wallets
                    .iter()
                    .map(|wallet| WalletRevenueSnapshot::failed(wallet.as_str(), date, message.as_str()))
                    .collect());
            }
        };

        let concurrency = self.concurrency(wallets.len());
        Span::current().record("concurrency", concurrency);

        let mut snapshots = Vec::with_capacity(wallets.len());
        for chunk in wallets.chunks(concurrency) {
            let analyses = chunk
                .iter()
                .map(|wallet| self.analyze_in_batch(wallet, date, &context));
            snapshots.extend(join_all(analyses).await);
        }

        let failed = snapshots.iter().filter(|s| s.is_error()).count();
        let priced_symbols = context.prices.lock().await.len();
        info!(
            network = %self.network.name,
            date = %date,
            wallets = snapshots.len(),
            failed,
            priced_symbols,
            "Batch session finished"
        );
        Ok(snapshots)
    }

    /// Resolves the block range and seeds the price map.
    async fn prepare(&self, date: NaiveDate) -> Result<BatchContext, RevenueError> {
        // A future date is the caller's mistake, not a shared-stage failure
        let range = self
            .resolver
            .resolve(date, self.network.chain)
            .await
            .map_err(|error| match error {
                BlockRangeError::Validation(error) => RevenueError::Validation(error),
                other => RevenueError::BlockRange(other),
            })?;

        let native_price = self
            .source
            .native_price()
            .await
            .map_err(|e| RevenueError::price_lookup(self.network.native_symbol.as_str(), e))?;

        let prices = self
            .seed_prices(&native_price)
            .instrument(spans::seed_prices(self.network.chain))
            .await;

        Ok(BatchContext {
            range,
            native_price,
            prices: Mutex::new(prices),
        })
    }

    async fn seed_prices(&self, native_price: &BigDecimal) -> PriceMap {
        let mut prices = PriceMap::with_stablecoins(&self.network.stablecoins);
        prices.insert_first(&self.network.native_symbol, native_price.clone());

        let wrapped = format!("W{}", self.network.native_symbol);
        if self.network.token(&wrapped).is_some() {
            prices.insert_first(&wrapped, native_price.clone());
        }

        for symbol in self.network.pair_symbols() {
            if prices.contains(symbol) {
                continue;
            }
            let Some(token) = self.network.token(symbol) else {
                continue;
            };
            match self.source.token_price(token.address).await {
                Ok(Some(price)) => {
                    if prices.insert_first(symbol, price.clone()) {
                        debug!(symbol, price = %price, "Seeded token price from upstream");
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(symbol, error = %error, "Token price lookup failed, relying on swaps");
                }
            }
        }
        prices
    }

    async fn analyze_in_batch(
        &self,
        input: &str,
        date: NaiveDate,
        context: &BatchContext,
    ) -> WalletRevenueSnapshot {
        let wallet = match parse_wallet(input) {
            Ok(wallet) => wallet,
            Err(error) => {
                warn!(input, error = %error, "Rejected wallet");
                return WalletRevenueSnapshot::failed(input, date, error.to_string());
            }
        };

        let span = spans::analyze_wallet(self.network.chain, wallet, date);
        match self.wallet_pipeline(wallet, date, context).instrument(span).await {
            Ok((tokens_value, summary)) => {
                WalletRevenueSnapshot::completed(input, date, tokens_value, summary)
            }
            Err(error) => {
                warn!(wallet = %wallet, error = %error, "Wallet analysis failed");
                WalletRevenueSnapshot::failed(input, date, error.to_string())
            }
        }
    }

    fn tracked_tokens(&self) -> Vec<TrackedToken> {
        self.network
            .pair_symbols()
            .into_iter()
            .filter_map(|symbol| self.network.token(symbol))
            .cloned()
            .collect()
    }

    fn window_for(&self, symbol: &str, date: NaiveDate) -> PromotionWindow {
        self.network
            .token(symbol)
            .map_or(PromotionWindow::Outside, |token| {
                token.promotion_window(date, self.network.is_primary)
            })
    }

    async fn wallet_pipeline(
        &self,
        wallet: Address,
        date: NaiveDate,
        context: &BatchContext,
    ) -> Result<(BigDecimal, TransactionSummary), RevenueError> {
        let tokens = self.tracked_tokens();

        let transfers = self
            .fetcher
            .fetch_wallet_transfers(wallet, &tokens, &context.range)
            .await?;
        let native_balance = self
            .fetcher
            .native_balance(wallet, &self.network.native_symbol)
            .await?;
        let mut token_balances = Vec::with_capacity(tokens.len());
        for token in &tokens {
            token_balances.push((token, self.fetcher.token_balance(wallet, token).await?));
        }

        let exchanges = exchange::reconstruct(wallet, &transfers, &self.network.pairs);

        // The batch map is held for the whole pass so inferences stay in swap order
        let prices = {
            let mut shared = context.prices.lock().await;
            for inconsistency in discover_into(&mut shared, &exchanges) {
                warn!(
                    wallet = %wallet,
                    hash = %inconsistency.hash,
                    from = %inconsistency.from_symbol,
                    to = %inconsistency.to_symbol,
                    expected = %inconsistency.expected_to_amount,
                    actual = %inconsistency.actual_to_amount,
                    deviation = %inconsistency.deviation,
                    "Swap rate deviates from known prices"
                );
            }
            shared.clone()
        };

        let loss = loss::compute(
            &exchanges,
            &prices,
            &self.network.stablecoins,
            &context.native_price,
        );

        let native_value = WeiAmount::new(native_balance).to_native() * &context.native_price;
        let tokens_value = token_balances
            .iter()
            .fold(native_value, |acc, (token, raw)| {
                acc + token.decimals.normalize(*raw) * prices.price_or_zero(&token.symbol)
            });

        let volumes = loss
            .valid_volume_by_target
            .iter()
            .map(|(symbol, volume)| (volume.clone(), self.window_for(symbol, date)));
        let points = self.points.estimate_weighted(&tokens_value, volumes);

        let unpriced_symbols = unpriced_symbols(&exchanges, &prices);
        if !unpriced_symbols.is_empty() {
            debug!(wallet = %wallet, symbols = ?unpriced_symbols, "Traded symbols without a price");
        }

        info!(
            wallet = %wallet,
            transfers = transfers.len(),
            exchanges = exchanges.len(),
            trading_loss = %loss.trading_loss,
            gas_loss = %loss.gas_loss,
            valid_volume = %loss.valid_volume,
            points = points.total,
            "Wallet analyzed"
        );

        let summary = TransactionSummary {
            total_loss: loss.total_loss(),
            loss,
            points,
            transfer_count: transfers.len(),
            exchanges,
            unpriced_symbols,
        };
        Ok((tokens_value, summary))
    }
}

fn unpriced_symbols(exchanges: &[ExchangeTransaction], prices: &PriceMap) -> Vec<String> {
    exchanges
        .iter()
        .flat_map(|e| [e.from_symbol.as_str(), e.to_symbol.as_str()])
        .filter(|symbol| !prices.contains(symbol))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};

    fn swap(from: &str, to: &str) -> ExchangeTransaction {
        ExchangeTransaction {
            hash: B256::ZERO,
            from_symbol: from.to_string(),
            to_symbol: to.to_string(),
            from_amount: BigDecimal::from(1),
            to_amount: BigDecimal::from(1),
            block_number: 1,
            timestamp: 1,
            gas_used: U256::ZERO,
            gas_price: U256::ZERO,
        }
    }

    #[test]
    fn test_unpriced_symbols_are_sorted_and_unique() {
        let prices = PriceMap::with_stablecoins(["USDT"]);
        let exchanges = vec![swap("USDT", "ZED"), swap("ALPHA", "ZED"), swap("ZED", "USDT")];
        assert_eq!(unpriced_symbols(&exchanges, &prices), vec!["ALPHA", "ZED"]);
        assert!(unpriced_symbols(&[], &prices).is_empty());
    }
}
