//! Price discovery from reconstructed swaps
//!
//! Most tokens a wallet trades have no direct price feed. Their USD prices are
//! inferred from the swaps themselves: a swap between a priced and an unpriced
//! symbol prices the second one at the swap's rate.
//!
//! # Architecture
//!
//! 1. The map is seeded with stablecoins at 1, the native token's spot price
//!    and any token the upstream can price directly
//! 2. [`discover`] walks the swaps once in time order and fills in prices
//! 3. Swaps between two priced symbols are checked against the implied rate;
//!    large deviations are reported, never corrected
//!
//! The pass is greedy and order-dependent: the first inference for a symbol is
//! authoritative for the rest of the run.
//!
//! # Example
//!
//! ```rust,ignore
//! use alphascan::price::{discover, PriceMap};
//!
//! let seed = PriceMap::with_stablecoins(["USDT", "USDC"]);
//! let result = discover(&exchanges, seed);
//! for inconsistency in &result.inconsistencies {
//!     println!("{} -> {}: off by {}", inconsistency.from_symbol, inconsistency.to_symbol, inconsistency.deviation);
//! }
//! ```

mod discovery;
mod map;

pub use discovery::{
    discover, discover_into, max_rate_deviation, PriceDiscovery, PriceInconsistency,
};
pub use map::PriceMap;
