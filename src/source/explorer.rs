// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block-explorer style API adapter.
//!
//! Every call is a GET on one endpoint with `chainid`, `module`, `action` and
//! `apikey` query parameters. Responses are wrapped in an envelope:
//!
//! ```json
//! { "status": "1", "message": "OK", "result": ... }
//! ```
//!
//! `status == "0"` is a failure, except for the "No transactions found" and
//! "No records found" messages, which mean an empty result. The latest block is
//! served through the JSON-RPC proxy module and has no envelope.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::parse;
use super::{ChainDataSource, Closest, PageCursor, TransferPage, TransferQuery};
use crate::config::ApiFlavor;
use crate::errors::ApiError;
use crate::keys::SelectedCredential;
use crate::transfers::RawTransferEvent;
use crate::transport::{DefaultTransport, HttpResponse, KeyedRequest, RetryPolicy, UpstreamClient};

const EMPTY_RESULT_MESSAGES: &[&str] = &["No transactions found", "No records found"];

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerTransfer {
    block_number: String,
    time_stamp: String,
    hash: String,
    from: String,
    to: String,
    value: String,
    #[serde(default)]
    gas_price: String,
    #[serde(default)]
    gas_used: String,
    #[serde(default)]
    log_index: Option<String>,
}

/// Unwraps the status envelope. `Ok(None)` is an empty listing.
fn open_envelope(operation: &str, response: HttpResponse) -> Result<Option<Value>, ApiError> {
    classify_envelope(operation, response.json(operation)?)
}

fn classify_envelope(operation: &str, envelope: Envelope) -> Result<Option<Value>, ApiError> {
    if envelope.status == "1" {
        return Ok(Some(envelope.result));
    }

    let detail = match &envelope.result {
        Value::String(s) => s.clone(),
        _ => String::new(),
    };
    let is_empty = EMPTY_RESULT_MESSAGES
        .iter()
        .any(|m| envelope.message.contains(m) || detail.contains(m));
    if is_empty {
        return Ok(None);
    }

    let lowered = format!("{} {}", envelope.message, detail).to_lowercase();
    if lowered.contains("rate limit") {
        return Err(ApiError::RateLimited {
            operation: operation.to_string(),
            message: detail,
        });
    }
    if lowered.contains("invalid api key") || lowered.contains("missing/invalid api key") {
        return Err(ApiError::InvalidKey {
            operation: operation.to_string(),
            message: detail,
        });
    }
    if envelope.message.is_empty() && detail.is_empty() {
        return Err(ApiError::data_shape(operation, "status 0 without message"));
    }
    Err(ApiError::rejected(
        operation,
        format!("{}: {}", envelope.message, detail),
    ))
}

fn result_string(operation: &str, result: Option<Value>) -> Result<String, ApiError> {
    match result {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ApiError::data_shape(
            operation,
            format!("expected a string result, got {other}"),
        )),
        None => Err(ApiError::data_shape(operation, "empty result")),
    }
}

/// Block-explorer API for one chain.
#[derive(Clone)]
pub struct ExplorerApi<S = DefaultTransport> {
    client: UpstreamClient<S>,
    base_url: Url,
    chain_id: u64,
}

impl<S> ExplorerApi<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    /// Creates an adapter for `chain_id` at `base_url`.
    pub fn new(client: UpstreamClient<S>, base_url: Url, chain_id: u64) -> Self {
        Self {
            client,
            base_url,
            chain_id,
        }
    }

    fn request(
        &self,
        module: &str,
        action: &str,
        params: &[(&str, String)],
        credential: &SelectedCredential,
    ) -> KeyedRequest {
        let mut request = KeyedRequest::new(format!("{module}/{action}"), self.base_url.clone())
            .query("chainid", self.chain_id)
            .query("module", module)
            .query("action", action);
        for (name, value) in params {
            request = request.query(*name, value);
        }
        request.query("apikey", &credential.key)
    }

    async fn call<T, P>(
        &self,
        module: &str,
        action: &str,
        params: Vec<(&str, String)>,
        parse: P,
    ) -> Result<T, ApiError>
    where
        P: Fn(&str, HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        self.call_with(self.client.retry_policy(), module, action, params, parse)
            .await
    }

    async fn call_with<T, P>(
        &self,
        retry: RetryPolicy,
        module: &str,
        action: &str,
        params: Vec<(&str, String)>,
        parse: P,
    ) -> Result<T, ApiError>
    where
        P: Fn(&str, HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        let operation = format!("{module}/{action}");
        self.client
            .request_with(
                retry,
                &operation,
                |credential| self.request(module, action, &params, credential),
                |response| parse(&operation, response),
            )
            .await
    }

    fn convert_transfer(
        operation: &str,
        query: &TransferQuery,
        position: u64,
        record: ExplorerTransfer,
    ) -> Result<RawTransferEvent, ApiError> {
        let log_index = match record.log_index.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse::number(operation, "logIndex", raw)?,
            _ => position,
        };
        let zero_if_empty = |field: &str, raw: &str| {
            if raw.trim().is_empty() {
                Ok(U256::ZERO)
            } else {
                parse::decimal_u256(operation, field, raw)
            }
        };

        Ok(RawTransferEvent {
            hash: parse::tx_hash(operation, &record.hash)?,
            log_index,
            token: query.token.address,
            from: parse::address(operation, "from", &record.from)?,
            to: parse::address(operation, "to", &record.to)?,
            symbol: query.token.symbol.clone(),
            raw_amount: parse::decimal_u256(operation, "value", &record.value)?,
            decimals: query.token.decimals,
            block_number: parse::number(operation, "blockNumber", &record.block_number)?,
            timestamp: parse::number(operation, "timeStamp", &record.time_stamp)?,
            gas_used: zero_if_empty("gasUsed", &record.gas_used)?,
            gas_price: zero_if_empty("gasPrice", &record.gas_price)?,
        })
    }
}

#[async_trait]
impl<S> ChainDataSource for ExplorerApi<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::Explorer
    }

    async fn native_balance(&self, wallet: Address) -> Result<U256, ApiError> {
        let params = vec![("address", wallet.to_string()), ("tag", "latest".to_string())];
        self.call("account", "balance", params, |operation, response| {
            let raw = result_string(operation, open_envelope(operation, response)?)?;
            parse::decimal_u256(operation, "result", &raw)
        })
        .await
    }

    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, ApiError> {
        let params = vec![
            ("contractaddress", token.to_string()),
            ("address", wallet.to_string()),
            ("tag", "latest".to_string()),
        ];
        self.call("account", "tokenbalance", params, |operation, response| {
            match open_envelope(operation, response)? {
                None => Ok(U256::ZERO),
                result => parse::decimal_u256(operation, "result", &result_string(operation, result)?),
            }
        })
        .await
    }

    async fn token_transfers(
        &self,
        query: &TransferQuery,
        cursor: Option<&PageCursor>,
    ) -> Result<TransferPage, ApiError> {
        let start_block = match cursor {
            None => query.start_block,
            Some(PageCursor::FromBlock(block)) => *block,
            Some(PageCursor::Token(token)) => {
                return Err(ApiError::data_shape(
                    "account/tokentx",
                    format!("explorer listings are block-paged, got cursor {token:?}"),
                ))
            }
        };

        // page x offset may not pass 10000, so every request reads page 1
        let params = vec![
            ("contractaddress", query.token.address.to_string()),
            ("address", query.wallet.to_string()),
            ("startblock", start_block.to_string()),
            ("endblock", query.end_block.to_string()),
            ("page", "1".to_string()),
            ("offset", query.page_size.to_string()),
            ("sort", "asc".to_string()),
        ];

        self.call("account", "tokentx", params, |operation, response| {
            let records: Vec<ExplorerTransfer> = match open_envelope(operation, response)? {
                None => return Ok(TransferPage::default()),
                Some(result) => serde_json::from_value(result)
                    .map_err(|e| ApiError::data_shape(operation, e.to_string()))?,
            };

            let transfers = records
                .into_iter()
                .enumerate()
                .map(|(i, record)| Self::convert_transfer(operation, query, i as u64, record))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(TransferPage::from_block_listing(transfers, query.page_size))
        })
        .await
    }

    async fn block_by_timestamp(
        &self,
        timestamp: i64,
        closest: Closest,
    ) -> Result<u64, ApiError> {
        let params = vec![
            ("timestamp", timestamp.to_string()),
            ("closest", closest.as_str().to_string()),
        ];
        // Single attempt: the block range resolver owns the retry schedule
        self.call_with(
            RetryPolicy::no_retry(),
            "block",
            "getblocknobytime",
            params,
            |operation, response| {
                let raw = result_string(operation, open_envelope(operation, response)?)?;
                parse::number(operation, "result", &raw)
            },
        )
        .await
    }

    async fn latest_block(&self) -> Result<u64, ApiError> {
        self.call_with(
            RetryPolicy::no_retry(),
            "proxy",
            "eth_blockNumber",
            Vec::new(),
            |operation, response| {
                let body: Value = response.json(operation)?;
                if let Some(error) = body.get("error") {
                    return Err(ApiError::rejected(operation, error.to_string()));
                }
                let hex = body
                    .get("result")
                    .and_then(Value::as_str)
                    .filter(|result| result.starts_with("0x"))
                    .map(str::to_owned);
                if let Some(result) = hex {
                    return parse::hex_u64(operation, "result", &result);
                }

                // Failures on the proxy module come back in the regular envelope
                let envelope: Envelope = serde_json::from_value(body)
                    .map_err(|e| ApiError::data_shape(operation, e.to_string()))?;
                classify_envelope(operation, envelope)?;
                Err(ApiError::data_shape(operation, "expected a hex block number"))
            },
        )
        .await
    }

    async fn native_price(&self) -> Result<BigDecimal, ApiError> {
        self.call("stats", "ethprice", Vec::new(), |operation, response| {
            match open_envelope(operation, response)? {
                Some(Value::Object(fields)) => {
                    let price = fields
                        .get("ethusd")
                        .ok_or_else(|| ApiError::data_shape(operation, "missing ethusd"))?;
                    parse::usd_price(operation, "ethusd", price)
                }
                other => Err(ApiError::data_shape(
                    operation,
                    format!("expected a price object, got {other:?}"),
                )),
            }
        })
        .await
    }

    async fn token_price(&self, _token: Address) -> Result<Option<BigDecimal>, ApiError> {
        Ok(None)
    }
}
