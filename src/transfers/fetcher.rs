// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tracing::{debug, info, Instrument};

use super::event::RawTransferEvent;
use crate::blocks::BlockRange;
use crate::config::{constants::MAX_PAGE_SIZE, TrackedToken};
use crate::errors::FetchError;
use crate::source::{ChainDataSource, PageCursor, TransferQuery};
use crate::tracing::spans;

/// Pages through a wallet's token transfers and reads its balances.
///
/// Every call goes through the source's upstream client, so pacing, key
/// rotation and retries apply per page.
#[derive(Clone)]
pub struct TransactionFetcher {
    source: Arc<dyn ChainDataSource>,
    page_size: u32,
}

impl TransactionFetcher {
    /// Creates a fetcher that requests `page_size` records per page
    /// (clamped to `1..=10_000`).
    pub fn new(source: Arc<dyn ChainDataSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Records requested per page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetches every transfer of `token` to or from `wallet` within `range`.
    ///
    /// An empty listing is an empty vector. Any other upstream failure is
    /// returned as [`FetchError::TokenTransfers`] naming the failed page.
    pub async fn fetch_transfers(
        &self,
        wallet: Address,
        token: &TrackedToken,
        range: &BlockRange,
    ) -> Result<Vec<RawTransferEvent>, FetchError> {
        let span = spans::fetch_transfers(wallet, token.address, range.start_block, range.end_block);
        async {
            let query = TransferQuery {
                wallet,
                token: token.clone(),
                start_block: range.start_block,
                end_block: range.end_block,
                page_size: self.page_size,
            };

            let mut transfers = Vec::new();
            let mut cursor: Option<PageCursor> = None;
            let mut page = 1u32;
            loop {
                let listing = self
                    .source
                    .token_transfers(&query, cursor.as_ref())
                    .await
                    .map_err(|source| FetchError::TokenTransfers {
                        wallet,
                        token: token.address,
                        page,
                        source,
                    })?;

                debug!(page, records = listing.transfers.len(), "Fetched transfer page");
                transfers.extend(listing.transfers);

                match listing.next {
                    Some(next) if cursor.as_ref() != Some(&next) => {
                        cursor = Some(next);
                        page += 1;
                    }
                    _ => break,
                }
            }

            Ok(transfers)
        }
        .instrument(span)
        .await
    }

    /// Fetches the transfers of every token in `tokens`, one token at a time.
    ///
    /// The same log listed under two tokens or on two pages is kept once. The
    /// result is ordered by timestamp, block and log index.
    pub async fn fetch_wallet_transfers(
        &self,
        wallet: Address,
        tokens: &[TrackedToken],
        range: &BlockRange,
    ) -> Result<Vec<RawTransferEvent>, FetchError> {
        let span = spans::fetch_wallet_transfers(wallet, tokens.len());
        async {
            let mut seen = HashSet::new();
            let mut merged = Vec::new();
            for token in tokens {
                for transfer in self.fetch_transfers(wallet, token, range).await? {
                    if seen.insert(transfer.dedup_key()) {
                        merged.push(transfer);
                    }
                }
            }
            merged.sort_by_key(RawTransferEvent::order_key);

            info!(
                wallet = %wallet,
                transfers = merged.len(),
                tokens = tokens.len(),
                "Fetched wallet transfers"
            );
            Ok(merged)
        }
        .instrument(span)
        .await
    }

    /// Native balance of `wallet` in wei.
    pub async fn native_balance(
        &self,
        wallet: Address,
        native_symbol: &str,
    ) -> Result<U256, FetchError> {
        self.source
            .native_balance(wallet)
            .await
            .map_err(|source| FetchError::Balance {
                wallet,
                asset: native_symbol.to_string(),
                source,
            })
    }

    /// Raw balance of `token` held by `wallet`.
    pub async fn token_balance(
        &self,
        wallet: Address,
        token: &TrackedToken,
    ) -> Result<U256, FetchError> {
        self.source
            .token_balance(wallet, token.address)
            .await
            .map_err(|source| FetchError::Balance {
                wallet,
                asset: token.symbol.clone(),
                source,
            })
    }
}
