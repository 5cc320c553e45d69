//! Well-known addresses and constants
//!
//! This module centralizes magic constants and well-known addresses used
//! throughout the alphascan crate.

use alloy_primitives::{address, Address};

/// Default timeout for each upstream HTTP request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default floor for the spacing between dispatches
pub const DEFAULT_BASE_INTERVAL_MS: u64 = 200;

/// Largest page the explorer API accepts for transfer listings
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Symbols treated as USD stablecoins when a network does not list its own
pub const DEFAULT_STABLECOINS: &[&str] = &["USDT", "USDC", "BUSD", "FDUSD", "DAI"];

/// Well-known stablecoin addresses
pub mod stablecoins {
    use super::*;

    /// Binance-Peg BSC-USD (USDT) on BNB Smart Chain, 18 decimals
    ///
    /// Contract: 0x55d398326f99059fF775485246999027B3197955
    pub const BSC_USDT: Address = address!("55d398326f99059ff775485246999027b3197955");

    /// Binance-Peg USDC on BNB Smart Chain, 18 decimals
    ///
    /// Contract: 0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d
    pub const BSC_BINANCE_PEG_USDC: Address = address!("8ac76a51cc950d9822d68b83fe1ad97b32cd580d");
}
