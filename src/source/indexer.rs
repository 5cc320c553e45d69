// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Path-based indexer API adapter.
//!
//! Endpoints are addressed by path under the API root, the chain is passed as a
//! hex chain id (`chain=0x38`) and the key travels in the `X-API-Key` header.
//! Responses carry no status envelope; HTTP status codes signal failures.
//!
//! Transfer listings are cursor-paged and do not include gas data, so the gas of
//! each listed transaction is looked up separately.

use std::collections::HashMap;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::parse;
use super::{ChainDataSource, Closest, PageCursor, TransferPage, TransferQuery};
use crate::config::ApiFlavor;
use crate::errors::ApiError;
use crate::keys::SelectedCredential;
use crate::transfers::RawTransferEvent;
use crate::transport::{DefaultTransport, HttpResponse, KeyedRequest, RetryPolicy, UpstreamClient};

/// Largest page the indexer serves.
const MAX_INDEXER_PAGE: u32 = 100;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Deserialize)]
struct NativeBalance {
    balance: String,
}

#[derive(Debug, Deserialize)]
struct TokenBalance {
    token_address: String,
    balance: String,
}

#[derive(Debug, Deserialize)]
struct TransferListing {
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    result: Vec<IndexerTransfer>,
}

#[derive(Debug, Deserialize)]
struct IndexerTransfer {
    transaction_hash: String,
    log_index: Value,
    block_number: Value,
    block_timestamp: String,
    from_address: String,
    to_address: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct TransactionGas {
    #[serde(default)]
    gas_price: Option<String>,
    #[serde(default)]
    receipt_gas_used: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DateToBlock {
    block: Value,
    timestamp: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPrice {
    usd_price: Option<Value>,
}

/// Indexer API for one chain.
#[derive(Clone)]
pub struct IndexerApi<S = DefaultTransport> {
    client: UpstreamClient<S>,
    base_url: Url,
    chain_id: u64,
    wrapped_native: Option<Address>,
}

impl<S> IndexerApi<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    /// Creates an adapter for `chain_id` under the API root `base_url`.
    ///
    /// The native price is derived from the wrapped native token, if given.
    pub fn new(
        client: UpstreamClient<S>,
        base_url: Url,
        chain_id: u64,
        wrapped_native: Option<Address>,
    ) -> Self {
        Self {
            client,
            base_url,
            chain_id,
            wrapped_native,
        }
    }

    fn chain_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    fn endpoint(&self, operation: &str, path: &str) -> Result<Url, ApiError> {
        let joined = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ApiError::data_shape(operation, format!("bad endpoint {joined}: {e}")))
    }

    async fn get<T, P>(
        &self,
        operation: &str,
        path: &str,
        params: Vec<(&str, String)>,
        parse: P,
    ) -> Result<T, ApiError>
    where
        P: Fn(HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        self.get_with(self.client.retry_policy(), operation, path, params, parse)
            .await
    }

    async fn get_with<T, P>(
        &self,
        retry: RetryPolicy,
        operation: &str,
        path: &str,
        params: Vec<(&str, String)>,
        parse: P,
    ) -> Result<T, ApiError>
    where
        P: Fn(HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        let url = self.endpoint(operation, path)?;
        let chain = self.chain_hex();
        let build = |credential: &SelectedCredential| {
            let mut request = KeyedRequest::new(operation, url.clone()).query("chain", &chain);
            for (name, value) in &params {
                request = request.query(*name, value);
            }
            request.header(API_KEY_HEADER, credential.key.clone())
        };
        self.client.request_with(retry, operation, build, parse).await
    }

    async fn transaction_gas(&self, hash: TxHash) -> Result<(U256, U256), ApiError> {
        let operation = "transaction";
        self.get(operation, &format!("transaction/{hash}"), Vec::new(), |response| {
            let gas: TransactionGas = response.json(operation)?;
            let field = |name: &str, raw: Option<&String>| match raw {
                Some(raw) if !raw.trim().is_empty() => parse::decimal_u256(operation, name, raw),
                _ => Ok(U256::ZERO),
            };
            Ok((
                field("receipt_gas_used", gas.receipt_gas_used.as_ref())?,
                field("gas_price", gas.gas_price.as_ref())?,
            ))
        })
        .await
    }

    fn convert_transfer(
        operation: &str,
        query: &TransferQuery,
        record: IndexerTransfer,
    ) -> Result<RawTransferEvent, ApiError> {
        Ok(RawTransferEvent {
            hash: parse::tx_hash(operation, &record.transaction_hash)?,
            log_index: parse::flexible_u64(operation, "log_index", &record.log_index)?,
            token: query.token.address,
            from: parse::address(operation, "from_address", &record.from_address)?,
            to: parse::address(operation, "to_address", &record.to_address)?,
            symbol: query.token.symbol.clone(),
            raw_amount: parse::decimal_u256(operation, "value", &record.value)?,
            decimals: query.token.decimals,
            block_number: parse::flexible_u64(operation, "block_number", &record.block_number)?,
            timestamp: parse::rfc3339_timestamp(operation, "block_timestamp", &record.block_timestamp)?,
            gas_used: U256::ZERO,
            gas_price: U256::ZERO,
        })
    }
}

#[async_trait]
impl<S> ChainDataSource for IndexerApi<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::Indexer
    }

    async fn native_balance(&self, wallet: Address) -> Result<U256, ApiError> {
        let operation = "native_balance";
        self.get(operation, &format!("{wallet}/balance"), Vec::new(), |response| {
            let balance: NativeBalance = response.json(operation)?;
            parse::decimal_u256(operation, "balance", &balance.balance)
        })
        .await
    }

    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, ApiError> {
        let operation = "token_balances";
        let params = vec![("token_addresses[0]", token.to_string())];
        self.get(operation, &format!("{wallet}/erc20"), params, |response| {
            let balances: Vec<TokenBalance> = response.json(operation)?;
            for entry in balances {
                if parse::address(operation, "token_address", &entry.token_address)? == token {
                    return parse::decimal_u256(operation, "balance", &entry.balance);
                }
            }
            Ok(U256::ZERO)
        })
        .await
    }

    async fn token_transfers(
        &self,
        query: &TransferQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<TransferPage, ApiError> {
        let operation = "erc20_transfers";
        let mut params = vec![
            ("contract_addresses[0]", query.token.address.to_string()),
            ("from_block", query.start_block.to_string()),
            ("to_block", query.end_block.to_string()),
            ("limit", query.page_size.min(MAX_INDEXER_PAGE).to_string()),
            ("order", "ASC".to_string()),
        ];
        match cursor {
            None => {}
            Some(PageCursor::Token(token)) => params.push(("cursor", token.clone())),
            Some(PageCursor::FromBlock(block)) => {
                return Err(ApiError::data_shape(
                    operation,
                    format!("indexer listings are cursor-paged, got start block {block}"),
                ))
            }
        }

        let (mut transfers, next) = self
            .get(
                operation,
                &format!("{}/erc20/transfers", query.wallet),
                params,
                |response| {
                    let listing: TransferListing = response.json(operation)?;
                    let transfers = listing
                        .result
                        .into_iter()
                        .map(|record| Self::convert_transfer(operation, query, record))
                        .collect::<Result<Vec<_>, _>>()?;
                    let next = listing
                        .cursor
                        .filter(|c| !c.is_empty())
                        .map(PageCursor::Token);
                    Ok((transfers, next))
                },
            )
            .await?;

        let mut gas: HashMap<TxHash, (U256, U256)> = HashMap::new();
        for transfer in &transfers {
            if !gas.contains_key(&transfer.hash) {
                gas.insert(transfer.hash, self.transaction_gas(transfer.hash).await?);
            }
        }
        debug!(transactions = gas.len(), "Fetched gas for listed transfers");

        for transfer in &mut transfers {
            if let Some((gas_used, gas_price)) = gas.get(&transfer.hash) {
                transfer.gas_used = *gas_used;
                transfer.gas_price = *gas_price;
            }
        }

        Ok(TransferPage { transfers, next })
    }

    async fn block_by_timestamp(
        &self,
        timestamp: i64,
        closest: Closest,
    ) -> Result<u64, ApiError> {
        let operation = "date_to_block";
        let params = vec![("date", timestamp.to_string())];
        // Single attempt: the block range resolver owns the retry schedule
        self.get_with(RetryPolicy::no_retry(), operation, "dateToBlock", params, |response| {
            let found: DateToBlock = response.json(operation)?;
            let block = parse::flexible_u64(operation, "block", &found.block)?;
            let block_time = parse::flexible_u64(operation, "timestamp", &found.timestamp)? as i64;

            // The indexer answers with the nearest block on either side
            Ok(match closest {
                Closest::After if block_time < timestamp => block + 1,
                Closest::Before if block_time > timestamp => block.saturating_sub(1),
                _ => block,
            })
        })
        .await
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        let operation = "latest_block";
        let path = format!("latestBlockNumber/{}", self.chain_hex());
        self.get_with(RetryPolicy::no_retry(), operation, &path, Vec::new(), |response| {
            let value: Value = response.json(operation)?;
            parse::flexible_u64(operation, "block", &value)
        })
        .await
    }

    async fn native_price(&self) -> Result<BigDecimal, ApiError> {
        let Some(wrapped) = self.wrapped_native else {
            return Err(ApiError::unsupported(
                "native_price without a wrapped native token",
                ApiFlavor::Indexer.to_string(),
            ));
        };
        self.token_price(wrapped).await?.ok_or_else(|| {
            ApiError::data_shape("token_price", "no price for the wrapped native token")
        })
    }

    async fn token_price(&self, token: Address) -> Result<Option<BigDecimal>, ApiError> {
        let operation = "token_price";
        self.get(operation, &format!("erc20/{token}/price"), Vec::new(), |response| {
            let price: TokenPrice = response.json(operation)?;
            price
                .usd_price
                .filter(|value| !value.is_null())
                .map(|value| parse::usd_price(operation, "usdPrice", &value))
                .transpose()
        })
        .await
    }
}
