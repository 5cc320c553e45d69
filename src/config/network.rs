//! Per-network configuration

use std::fmt;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ConfigError;
use crate::keys::Credential;
use crate::revenue::points::PromotionWindow;
use crate::types::decimals::TokenDecimals;

/// Which upstream API family a network talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// Block-explorer style `module`/`action` query API with a status envelope
    Explorer,
    /// Path-based indexer API keyed by hex chain id
    Indexer,
}

impl fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFlavor::Explorer => write!(f, "explorer"),
            ApiFlavor::Indexer => write!(f, "indexer"),
        }
    }
}

/// Upstream API family and its base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    /// API family
    pub flavor: ApiFlavor,
    /// Base URL (explorer: the query endpoint; indexer: the API root)
    pub base_url: Url,
}

/// A configured swap direction, e.g. `USDT -> TOKEN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// Symbol the wallet sells
    pub from: String,
    /// Symbol the wallet buys
    pub to: String,
}

impl TradingPair {
    /// Creates a pair; symbols are upper-cased.
    pub fn new(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        Self {
            from: from.as_ref().trim().to_uppercase(),
            to: to.as_ref().trim().to_uppercase(),
        }
    }

    /// The opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// An ERC-20 token whose transfers and balances are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedToken {
    /// Upper-case symbol
    pub symbol: String,
    /// Contract address
    pub address: Address,
    /// Decimal precision
    #[serde(default)]
    pub decimals: TokenDecimals,
    /// Date the token was listed, which opens its promotion window
    #[serde(default)]
    pub listed_on: Option<NaiveDate>,
    /// Length of the promotion window in days
    #[serde(default)]
    pub promotion_days: Option<u32>,
}

impl TrackedToken {
    /// Creates a token with no promotion window.
    pub fn new(symbol: impl AsRef<str>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_uppercase(),
            address,
            decimals: TokenDecimals::new(decimals),
            listed_on: None,
            promotion_days: None,
        }
    }

    /// Sets the promotion window.
    pub fn with_promotion(mut self, listed_on: NaiveDate, days: u32) -> Self {
        self.listed_on = Some(listed_on);
        self.promotion_days = Some(days);
        self
    }

    /// Promotion window that applies to trades of this token on `date`.
    ///
    /// The window covers `[listed_on, listed_on + promotion_days)`.
    pub fn promotion_window(&self, date: NaiveDate, is_primary: bool) -> PromotionWindow {
        let (Some(listed_on), Some(days)) = (self.listed_on, self.promotion_days) else {
            return PromotionWindow::Outside;
        };
        let Some(closes_on) = listed_on.checked_add_days(Days::new(u64::from(days))) else {
            return PromotionWindow::Outside;
        };

        if date >= listed_on && date < closes_on {
            if is_primary {
                PromotionWindow::PrimaryChain
            } else {
                PromotionWindow::OtherChain
            }
        } else {
            PromotionWindow::Outside
        }
    }
}

/// Where a trading day starts.
///
/// A trading day `D` starts at `start_hour:00` local time on `D` in a zone
/// `utc_offset_minutes` east of UTC and lasts 24 hours. The default is UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradingDayBoundary {
    /// Offset of the trading zone east of UTC, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Local hour at which the trading day starts (0-23)
    #[serde(default)]
    pub start_hour: u32,
}

impl TradingDayBoundary {
    /// UTC midnight to UTC midnight.
    pub const UTC_MIDNIGHT: Self = Self {
        utc_offset_minutes: 0,
        start_hour: 0,
    };

    fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    /// First instant of trading day `date`.
    pub fn day_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local = date.and_hms_opt(self.start_hour, 0, 0)?;
        let start = self.offset()?.from_local_datetime(&local).single()?;
        Some(start.with_timezone(&Utc))
    }

    /// First instant of the trading day after `date`.
    pub fn next_day_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.day_start(date.succ_opt()?)
    }

    /// Trading day that contains `instant`.
    pub fn trading_date(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        let local = instant.with_timezone(&self.offset()?);
        let shifted = local - chrono::Duration::hours(i64::from(self.start_hour));
        Some(shifted.date_naive())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_hour > 23 {
            return Err(ConfigError::invalid_value(
                "trading_day.start_hour",
                format!("{} is not an hour of the day", self.start_hour),
            ));
        }
        if self.offset().is_none() {
            return Err(ConfigError::invalid_value(
                "trading_day.utc_offset_minutes",
                format!("{} is out of range", self.utc_offset_minutes),
            ));
        }
        Ok(())
    }
}

/// Everything the engine needs to know about one network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Display name
    pub name: String,
    /// Chain
    pub chain: NamedChain,
    /// Native currency symbol (e.g. `BNB`)
    pub native_symbol: String,
    /// The promotion's primary network (higher points multiplier)
    pub is_primary: bool,
    /// Upstream API
    pub api: ApiEndpoint,
    /// Swap directions, in matching priority order
    pub pairs: Vec<TradingPair>,
    /// Upper-case stablecoin symbols, priced at 1 USD
    pub stablecoins: Vec<String>,
    /// Tokens whose transfers and balances are tracked
    pub tokens: Vec<TrackedToken>,
    /// Trading-day boundary
    pub boundary: TradingDayBoundary,
    /// API credentials for the upstream service
    pub credentials: Vec<Credential>,
}

impl NetworkConfig {
    /// Creates a configuration with no pairs, tokens or credentials.
    pub fn new(
        name: impl Into<String>,
        chain: NamedChain,
        native_symbol: impl AsRef<str>,
        api: ApiEndpoint,
    ) -> Self {
        Self {
            name: name.into(),
            chain,
            native_symbol: native_symbol.as_ref().trim().to_uppercase(),
            is_primary: false,
            api,
            pairs: Vec::new(),
            stablecoins: Vec::new(),
            tokens: Vec::new(),
            boundary: TradingDayBoundary::UTC_MIDNIGHT,
            credentials: Vec::new(),
        }
    }

    /// Marks the network as the promotion's primary network.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Appends a trading pair.
    pub fn with_pair(mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        self.pairs.push(TradingPair::new(from, to));
        self
    }

    /// Appends a stablecoin symbol.
    pub fn with_stablecoin(mut self, symbol: impl AsRef<str>) -> Self {
        self.stablecoins.push(symbol.as_ref().trim().to_uppercase());
        self
    }

    /// Appends a tracked token.
    pub fn with_token(mut self, token: TrackedToken) -> Self {
        self.tokens.push(token);
        self
    }

    /// Appends a credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credentials.push(credential);
        self
    }

    /// Sets the trading-day boundary.
    pub fn with_boundary(mut self, boundary: TradingDayBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Numeric chain id.
    pub fn chain_id(&self) -> u64 {
        self.chain as u64
    }

    /// Returns `true` if `symbol` is a configured stablecoin.
    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.iter().any(|s| s == symbol)
    }

    /// Looks up a tracked token by symbol.
    pub fn token(&self, symbol: &str) -> Option<&TrackedToken> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    /// Looks up a tracked token by contract address.
    pub fn token_by_address(&self, address: Address) -> Option<&TrackedToken> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// Symbols that appear in any pair, in first-appearance order.
    pub fn pair_symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = Vec::new();
        for pair in &self.pairs {
            for symbol in [pair.from.as_str(), pair.to.as_str()] {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }
        symbols
    }

    /// Checks that the configured credentials include at least one usable key.
    ///
    /// This only covers the configured list. A running batch checks the live
    /// key pool instead, which may have been loaded or edited elsewhere.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if !self.credentials.iter().any(|c| c.active && !c.key.is_empty()) {
            return Err(ConfigError::NoActiveCredentials {
                network: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Checks that pairs, tokens and the trading-day boundary are complete
    /// enough to run a batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::NoTradingPairs {
                network: self.name.clone(),
            });
        }
        for pair in &self.pairs {
            for symbol in [&pair.from, &pair.to] {
                if self.token(symbol).is_none() {
                    return Err(ConfigError::MissingTokenAddress {
                        network: self.name.clone(),
                        symbol: symbol.clone(),
                        pair: pair.to_string(),
                    });
                }
            }
        }
        self.boundary.validate()
    }
}
