// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for alphascan integration tests
//!
//! Provides a scripted [`ChainDataSource`] and ready-made network fixtures so the
//! revenue pipeline can be driven without a real chain-data API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use alloy_chains::NamedChain;
use alloy_primitives::{address, Address, B256, U256};
use alphascan::source::{Closest, PageCursor, TransferPage, TransferQuery};
use alphascan::transport::{HttpResponse, KeyedRequest};
use alphascan::{
    ApiEndpoint, ApiError, ApiFlavor, ApiKeyPool, ChainDataSource, Credential, NetworkConfig,
    RawTransferEvent, TokenDecimals, TrackedToken,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::time::Instant;
use url::Url;

/// Seconds per block on the scripted chain (block = timestamp / 3).
pub const BLOCK_TIME_SECS: i64 = 3;

pub const USDT: Address = address!("55d398326f99059ff775485246999027b3197955");
pub const TOKEN: Address = address!("1111111111111111111111111111111111111111");
pub const COUNTERPARTY: Address = address!("9999999999999999999999999999999999999999");

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Deterministic wallet address `0xaa00..00NN`.
pub fn wallet(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xaa;
    bytes[19] = n;
    Address::from(bytes)
}

pub fn usdt_token() -> TrackedToken {
    TrackedToken::new("USDT", USDT, 18)
}

pub fn alpha_token() -> TrackedToken {
    TrackedToken::new("TOKEN", TOKEN, 18)
}

/// A BSC network trading USDT <-> TOKEN through an explorer endpoint.
pub fn bsc_network() -> NetworkConfig {
    NetworkConfig::new(
        "bsc",
        NamedChain::BinanceSmartChain,
        "BNB",
        ApiEndpoint {
            flavor: ApiFlavor::Explorer,
            base_url: Url::parse("https://api.example/v2/api").unwrap(),
        },
    )
    .primary()
    .with_pair("USDT", "TOKEN")
    .with_pair("TOKEN", "USDT")
    .with_stablecoin("USDT")
    .with_token(usdt_token())
    .with_token(alpha_token())
    .with_credential(Credential::new("KEY-000000000001", "primary").as_default())
    .with_credential(Credential::new("KEY-000000000002", "secondary").with_priority(1))
}

pub fn pool_for(network: &NetworkConfig) -> Arc<ApiKeyPool> {
    Arc::new(ApiKeyPool::new(network.credentials.clone()))
}

/// Raw amount of `units` whole tokens at `decimals`.
pub fn units(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(decimals))
}

/// Builder for one transfer log.
pub struct TransferBuilder {
    event: RawTransferEvent,
}

impl TransferBuilder {
    pub fn new(tx: u8, token: &TrackedToken, from: Address, to: Address, amount: u64) -> Self {
        Self {
            event: RawTransferEvent {
                hash: B256::with_last_byte(tx),
                log_index: 0,
                token: token.address,
                from,
                to,
                symbol: token.symbol.clone(),
                raw_amount: units(amount, token.decimals.as_u8()),
                decimals: token.decimals,
                block_number: 0,
                timestamp: 0,
                gas_used: U256::from(100_000u64),
                gas_price: U256::from(1_000_000_000u64),
            },
        }
    }

    /// Places the log at `timestamp`, in the block the scripted chain assigns to it.
    pub fn at(mut self, timestamp: i64) -> Self {
        self.event.timestamp = timestamp;
        self.event.block_number = (timestamp / BLOCK_TIME_SECS) as u64;
        self
    }

    pub fn log_index(mut self, log_index: u64) -> Self {
        self.event.log_index = log_index;
        self
    }

    pub fn decimals(mut self, decimals: TokenDecimals) -> Self {
        self.event.decimals = decimals;
        self
    }

    pub fn build(self) -> RawTransferEvent {
        self.event
    }
}

/// The two legs of a swap by `wallet`: `sold` of `from` out, `bought` of `to` in.
pub fn swap_legs(
    tx: u8,
    wallet: Address,
    from: &TrackedToken,
    sold: u64,
    to: &TrackedToken,
    bought: u64,
    timestamp: i64,
) -> Vec<RawTransferEvent> {
    vec![
        TransferBuilder::new(tx, from, wallet, COUNTERPARTY, sold)
            .at(timestamp)
            .log_index(0)
            .build(),
        TransferBuilder::new(tx, to, COUNTERPARTY, wallet, bought)
            .at(timestamp)
            .log_index(1)
            .build(),
    ]
}

/// Scripted chain data.
///
/// Blocks are `timestamp / 3`. Transfers are listed per (wallet, token) and
/// paged by page number. Failures can be scripted per wallet or for the native
/// price.
pub struct MockDataSource {
    transfers: Vec<RawTransferEvent>,
    failing_wallets: HashSet<Address>,
    native_balances: HashMap<Address, U256>,
    token_balances: HashMap<(Address, Address), U256>,
    token_prices: HashMap<Address, BigDecimal>,
    native_price: Option<BigDecimal>,
    latest_block: u64,
    block_lookups: AtomicUsize,
    transfer_pages: AtomicUsize,
    listing_delay: Option<Duration>,
    listings_in_flight: AtomicUsize,
    peak_listings_in_flight: AtomicUsize,
    first_listing_at: Mutex<HashMap<Address, Instant>>,
}

impl Default for MockDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataSource {
    pub fn new() -> Self {
        Self {
            transfers: Vec::new(),
            failing_wallets: HashSet::new(),
            native_balances: HashMap::new(),
            token_balances: HashMap::new(),
            token_prices: HashMap::new(),
            native_price: Some(dec("600")),
            latest_block: u64::MAX / 2,
            block_lookups: AtomicUsize::new(0),
            transfer_pages: AtomicUsize::new(0),
            listing_delay: None,
            listings_in_flight: AtomicUsize::new(0),
            peak_listings_in_flight: AtomicUsize::new(0),
            first_listing_at: Mutex::new(HashMap::new()),
        }
    }

    /// Every transfer listing takes `delay` to answer.
    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);
        self
    }

    pub fn with_transfers(mut self, transfers: impl IntoIterator<Item = RawTransferEvent>) -> Self {
        self.transfers.extend(transfers);
        self
    }

    /// Every transfer listing for `wallet` fails with a non-retryable rejection.
    pub fn failing_for(mut self, wallet: Address) -> Self {
        self.failing_wallets.insert(wallet);
        self
    }

    pub fn with_native_balance(mut self, wallet: Address, wei: U256) -> Self {
        self.native_balances.insert(wallet, wei);
        self
    }

    pub fn with_token_balance(mut self, wallet: Address, token: Address, raw: U256) -> Self {
        self.token_balances.insert((wallet, token), raw);
        self
    }

    pub fn with_token_price(mut self, token: Address, price: BigDecimal) -> Self {
        self.token_prices.insert(token, price);
        self
    }

    pub fn with_native_price(mut self, price: Option<BigDecimal>) -> Self {
        self.native_price = price;
        self
    }

    pub fn with_latest_block(mut self, latest_block: u64) -> Self {
        self.latest_block = latest_block;
        self
    }

    /// Timestamp lookups served so far.
    pub fn block_lookups(&self) -> usize {
        self.block_lookups.load(Ordering::SeqCst)
    }

    /// Transfer pages served so far.
    pub fn transfer_pages(&self) -> usize {
        self.transfer_pages.load(Ordering::SeqCst)
    }

    /// Most transfer listings that were ever answering at the same time.
    pub fn peak_listings_in_flight(&self) -> usize {
        self.peak_listings_in_flight.load(Ordering::SeqCst)
    }

    /// When the first transfer listing for `wallet` started.
    pub fn first_listing_at(&self, wallet: Address) -> Option<Instant> {
        self.first_listing_at.lock().unwrap().get(&wallet).copied()
    }

    fn listing(&self, query: &TransferQuery) -> Vec<RawTransferEvent> {
        let mut listing: Vec<_> = self
            .transfers
            .iter()
            .filter(|t| t.token == query.token.address)
            .filter(|t| t.from == query.wallet || t.to == query.wallet)
            .filter(|t| (query.start_block..=query.end_block).contains(&t.block_number))
            .cloned()
            .collect();
        listing.sort_by_key(|t| (t.block_number, t.log_index));
        listing
    }
}

#[async_trait]
impl ChainDataSource for MockDataSource {
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::Explorer
    }

    async fn native_balance(&self, wallet: Address) -> Result<U256, ApiError> {
        Ok(self.native_balances.get(&wallet).copied().unwrap_or_default())
    }

    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, ApiError> {
        Ok(self
            .token_balances
            .get(&(wallet, token))
            .copied()
            .unwrap_or_default())
    }

    async fn token_transfers(
        &self,
        query: &TransferQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<TransferPage, ApiError> {
        if self.failing_wallets.contains(&query.wallet) {
            return Err(ApiError::rejected("tokentx", "Query Timeout occured"));
        }
        self.transfer_pages.fetch_add(1, Ordering::SeqCst);
        self.first_listing_at
            .lock()
            .unwrap()
            .entry(query.wallet)
            .or_insert_with(Instant::now);

        if let Some(delay) = self.listing_delay {
            let now = self.listings_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_listings_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.listings_in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let start_block = match cursor {
            None => query.start_block,
            Some(PageCursor::FromBlock(block)) => *block,
            Some(PageCursor::Token(_)) => {
                return Err(ApiError::data_shape("tokentx", "unexpected cursor token"))
            }
        };
        let transfers: Vec<_> = self
            .listing(query)
            .into_iter()
            .filter(|t| t.block_number >= start_block)
            .take(query.page_size as usize)
            .collect();
        Ok(TransferPage::from_block_listing(transfers, query.page_size))
    }

    async fn block_by_timestamp(&self, timestamp: i64, closest: Closest) -> Result<u64, ApiError> {
        self.block_lookups.fetch_add(1, Ordering::SeqCst);
        let block = match closest {
            Closest::Before => timestamp.div_euclid(BLOCK_TIME_SECS),
            Closest::After => (timestamp + BLOCK_TIME_SECS - 1).div_euclid(BLOCK_TIME_SECS),
        };
        Ok(block as u64)
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        Ok(self.latest_block)
    }

    async fn native_price(&self) -> Result<BigDecimal, ApiError> {
        self.native_price
            .clone()
            .ok_or_else(|| ApiError::rejected("ethprice", "Service unavailable"))
    }

    async fn token_price(&self, token: Address) -> Result<Option<BigDecimal>, ApiError> {
        Ok(self.token_prices.get(&token).cloned())
    }
}

/// Transport that replays queued bodies per route and records every request.
///
/// The route of a request is its `action` query parameter when present (explorer
/// style), otherwise the last segment of its URL path (indexer style). A route
/// with nothing queued answers 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<KeyedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `200 OK` body for `route`.
    pub fn respond(&self, route: &str, body: &str) -> &Self {
        self.respond_with(route, HttpResponse::ok(body))
    }

    /// Queues an arbitrary response for `route`.
    pub fn respond_with(&self, route: &str, response: HttpResponse) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<KeyedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn route_of(request: &KeyedRequest) -> String {
        if let Some(action) = request.query_value("action") {
            return action.to_string();
        }
        request
            .url
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .unwrap_or_default()
    }
}

impl tower::Service<KeyedRequest> for MockTransport {
    type Response = HttpResponse;
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), ApiError>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: KeyedRequest) -> Self::Future {
        let route = Self::route_of(&request);
        self.requests.lock().unwrap().push(request);
        let response = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front)
            .unwrap_or(HttpResponse {
                status: 404,
                body: format!("no route for {route}"),
            });
        Box::pin(async move { Ok(response) })
    }
}
