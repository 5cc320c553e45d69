//! Versioned network configuration documents
//!
//! Configuration documents carry a `schema` discriminant. Each version has its
//! own shape and is adapted into the one stable [`NetworkConfig`]:
//!
//! - `v1`: legacy explorer-only layout. Pairs are written `"A/B"` and mean both
//!   directions; tokens are a symbol-to-address map; keys are plain strings.
//! - `v2`: explicit layout with directed pairs, token metadata, API flavor,
//!   trading-day boundary and full credential records.

use std::collections::BTreeMap;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use chrono::NaiveDate;
use serde::Deserialize;
use url::Url;

use super::constants::DEFAULT_STABLECOINS;
use super::network::{
    ApiEndpoint, ApiFlavor, NetworkConfig, TrackedToken, TradingDayBoundary, TradingPair,
};
use crate::errors::ConfigError;
use crate::keys::Credential;

/// A network configuration document of any supported schema version.
///
/// # Examples
///
/// ```rust
/// use alphascan::NetworkConfigDocument;
///
/// let json = r#"{
///     "schema": "v1",
///     "network": "bsc",
///     "chain_id": 56,
///     "native_symbol": "BNB",
///     "explorer_url": "https://api.etherscan.io/v2/api",
///     "pairs": ["USDT/TOKEN"],
///     "token_addresses": {
///         "USDT": "0x55d398326f99059fF775485246999027B3197955",
///         "TOKEN": "0x1111111111111111111111111111111111111111"
///     },
///     "api_keys": ["KEY-000000000001"]
/// }"#;
///
/// let config = NetworkConfigDocument::from_json(json)?.into_network_config()?;
/// assert_eq!(config.pairs.len(), 2);
/// # Ok::<(), alphascan::ConfigError>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum NetworkConfigDocument {
    /// Legacy explorer layout
    V1(NetworkConfigV1),
    /// Current layout
    V2(NetworkConfigV2),
}

impl NetworkConfigDocument {
    /// Decodes a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::document(e.to_string()))
    }

    /// Adapts the document into a [`NetworkConfig`].
    pub fn into_network_config(self) -> Result<NetworkConfig, ConfigError> {
        match self {
            NetworkConfigDocument::V1(document) => document.adapt(),
            NetworkConfigDocument::V2(document) => document.adapt(),
        }
    }
}

impl NetworkConfig {
    /// Decodes and adapts a versioned JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        NetworkConfigDocument::from_json(json)?.into_network_config()
    }
}

/// Promotion metadata of a legacy token entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyListing {
    /// Listing date
    pub listed_on: NaiveDate,
    /// Promotion window length in days
    pub promotion_days: u32,
}

/// Legacy explorer-only configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfigV1 {
    /// Network name
    pub network: String,
    /// Numeric chain id
    pub chain_id: u64,
    /// Native currency symbol
    pub native_symbol: String,
    /// Primary network flag
    #[serde(default)]
    pub primary: bool,
    /// Explorer query endpoint
    pub explorer_url: Url,
    /// Undirected pairs written `"A/B"`
    pub pairs: Vec<String>,
    /// Stablecoin symbols (defaults to the well-known list)
    #[serde(default)]
    pub stablecoins: Option<Vec<String>>,
    /// Symbol to contract address
    pub token_addresses: BTreeMap<String, Address>,
    /// Symbol to decimals (18 when absent)
    #[serde(default)]
    pub token_decimals: BTreeMap<String, u8>,
    /// Symbol to promotion window
    #[serde(default)]
    pub listings: BTreeMap<String, LegacyListing>,
    /// Plain API keys; the first one is the network default
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl NetworkConfigV1 {
    fn adapt(self) -> Result<NetworkConfig, ConfigError> {
        let chain = chain_from_id(self.chain_id)?;

        let mut pairs: Vec<TradingPair> = Vec::new();
        for raw in &self.pairs {
            let pair = parse_legacy_pair(raw)?;
            for direction in [pair.clone(), pair.reversed()] {
                if !pairs.contains(&direction) {
                    pairs.push(direction);
                }
            }
        }

        let tokens = self
            .token_addresses
            .iter()
            .map(|(symbol, address)| {
                let decimals = self.token_decimals.get(symbol).copied().unwrap_or(18);
                let token = TrackedToken::new(symbol, *address, decimals);
                match self.listings.get(symbol) {
                    Some(listing) => token.with_promotion(listing.listed_on, listing.promotion_days),
                    None => token,
                }
            })
            .collect();

        let credentials = self
            .api_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let credential =
                    Credential::new(key.trim(), format!("key-{}", i + 1)).with_priority(i as u32);
                if i == 0 {
                    credential.as_default()
                } else {
                    credential
                }
            })
            .collect();

        Ok(NetworkConfig {
            name: self.network,
            chain,
            native_symbol: self.native_symbol.trim().to_uppercase(),
            is_primary: self.primary,
            api: ApiEndpoint {
                flavor: ApiFlavor::Explorer,
                base_url: self.explorer_url,
            },
            pairs,
            stablecoins: normalize_stablecoins(self.stablecoins),
            tokens,
            boundary: TradingDayBoundary::UTC_MIDNIGHT,
            credentials,
        })
    }
}

/// Current configuration layout.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfigV2 {
    /// Network name
    pub name: String,
    /// Numeric chain id
    pub chain_id: u64,
    /// Native currency symbol
    pub native_symbol: String,
    /// Primary network flag
    #[serde(default)]
    pub primary: bool,
    /// Upstream API
    pub api: ApiEndpoint,
    /// Directed pairs in matching order
    pub pairs: Vec<TradingPair>,
    /// Stablecoin symbols (defaults to the well-known list)
    #[serde(default)]
    pub stablecoins: Option<Vec<String>>,
    /// Tracked tokens
    pub tokens: Vec<TrackedToken>,
    /// Trading-day boundary (UTC midnight when absent)
    #[serde(default)]
    pub trading_day: TradingDayBoundary,
    /// API credentials
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl NetworkConfigV2 {
    fn adapt(self) -> Result<NetworkConfig, ConfigError> {
        Ok(NetworkConfig {
            name: self.name,
            chain: chain_from_id(self.chain_id)?,
            native_symbol: self.native_symbol.trim().to_uppercase(),
            is_primary: self.primary,
            api: self.api,
            pairs: self
                .pairs
                .iter()
                .map(|pair| TradingPair::new(&pair.from, &pair.to))
                .collect(),
            stablecoins: normalize_stablecoins(self.stablecoins),
            tokens: self
                .tokens
                .into_iter()
                .map(|token| TrackedToken {
                    symbol: token.symbol.trim().to_uppercase(),
                    ..token
                })
                .collect(),
            boundary: self.trading_day,
            credentials: self.credentials,
        })
    }
}

fn chain_from_id(chain_id: u64) -> Result<NamedChain, ConfigError> {
    NamedChain::try_from(chain_id)
        .map_err(|_| ConfigError::invalid_value("chain_id", format!("unknown chain id {chain_id}")))
}

fn parse_legacy_pair(raw: &str) -> Result<TradingPair, ConfigError> {
    match raw.split('/').map(str::trim).collect::<Vec<_>>().as_slice() {
        [from, to] if !from.is_empty() && !to.is_empty() => Ok(TradingPair::new(from, to)),
        _ => Err(ConfigError::invalid_value(
            "pairs",
            format!("{raw:?} is not written as A/B"),
        )),
    }
}

fn normalize_stablecoins(stablecoins: Option<Vec<String>>) -> Vec<String> {
    match stablecoins {
        Some(symbols) => symbols.iter().map(|s| s.trim().to_uppercase()).collect(),
        None => DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect(),
    }
}
