// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream chain-data capabilities.
//!
//! [`ChainDataSource`] is the one seam between the analysis engine and the
//! upstream service. Two adapters implement it:
//!
//! - [`ExplorerApi`]: block-explorer style `module`/`action` queries with a
//!   `{status, message, result}` envelope, key in the `apikey` query parameter
//! - [`IndexerApi`]: path-based indexer endpoints keyed by hex chain id, key in the
//!   `X-API-Key` header, cursor-paged listings
//!
//! Both sit on an [`UpstreamClient`](crate::transport::UpstreamClient), so every
//! call goes through key rotation and dispatch pacing. Block lookups are sent
//! once; the other calls retry under the client's policy.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{ApiFlavor, TrackedToken};
use crate::errors::ApiError;
use crate::transfers::RawTransferEvent;

mod explorer;
mod indexer;
mod parse;

pub use explorer::ExplorerApi;
pub use indexer::IndexerApi;

/// Which side of a timestamp a block lookup should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Closest {
    /// The last block at or before the timestamp
    Before,
    /// The first block at or after the timestamp
    After,
}

impl Closest {
    /// Query-string form (`before` / `after`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Closest::Before => "before",
            Closest::After => "after",
        }
    }
}

/// Position of the next page of a transfer listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// First block of the next listing (explorer)
    FromBlock(u64),
    /// Opaque continuation token (indexer)
    Token(String),
}

/// Parameters of a transfer listing.
#[derive(Debug, Clone)]
pub struct TransferQuery {
    /// Wallet whose transfers are listed
    pub wallet: Address,
    /// Token whose transfers are listed
    pub token: TrackedToken,
    /// First block (inclusive)
    pub start_block: u64,
    /// Last block (inclusive)
    pub end_block: u64,
    /// Records per page
    pub page_size: u32,
}

/// One page of a transfer listing.
#[derive(Debug, Clone, Default)]
pub struct TransferPage {
    /// Transfers on this page
    pub transfers: Vec<RawTransferEvent>,
    /// Where the next page starts, or `None` if this was the last page
    pub next: Option<PageCursor>,
}

impl TransferPage {
    /// Pages a block-ordered listing that asked for up to `page_size` records.
    ///
    /// A full listing may end partway through its last block, so that block
    /// is cut off and the next page starts at it. When the whole listing is a
    /// single block the records are kept and the next page starts after it.
    pub fn from_block_listing(mut transfers: Vec<RawTransferEvent>, page_size: u32) -> Self {
        let Some(last_block) = transfers.last().map(|t| t.block_number) else {
            return Self::default();
        };
        if transfers.len() < page_size as usize {
            return Self { transfers, next: None };
        }

        let cut = transfers
            .iter()
            .position(|t| t.block_number == last_block)
            .unwrap_or(transfers.len());
        let next = if cut == 0 {
            warn!(
                block = last_block,
                records = transfers.len(),
                "Block fills a whole page, later transfers in it are skipped"
            );
            last_block + 1
        } else {
            transfers.truncate(cut);
            last_block
        };
        Self {
            transfers,
            next: Some(PageCursor::FromBlock(next)),
        }
    }
}

/// Chain data needed by the revenue engine.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// The API family behind this source.
    fn flavor(&self) -> ApiFlavor;

    /// Native currency balance in wei.
    async fn native_balance(&self, wallet: Address) -> Result<U256, ApiError>;

    /// Raw balance of `token` held by `wallet`.
    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, ApiError>;

    /// One page of `query`'s transfers, starting at `cursor` (`None` for the first page).
    ///
    /// An empty listing is an empty page, not an error.
    async fn token_transfers(
        &self,
        query: &TransferQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<TransferPage, ApiError>;

    /// Block closest to a UNIX timestamp on the requested side.
    ///
    /// A single upstream attempt; retrying is up to the caller.
    async fn block_by_timestamp(&self, timestamp: i64, closest: Closest)
        -> Result<u64, ApiError>;

    /// Latest block number, in a single upstream attempt.
    async fn latest_block(&self) -> Result<u64, ApiError>;

    /// Native currency spot price in USD.
    async fn native_price(&self) -> Result<BigDecimal, ApiError>;

    /// Token spot price in USD, or `None` if the source cannot price tokens.
    async fn token_price(&self, token: Address) -> Result<Option<BigDecimal>, ApiError>;
}
