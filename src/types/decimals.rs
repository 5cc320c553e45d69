//! Token decimal precision and exact normalization of raw amounts

use alloy_primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// ERC-20 token decimal precision
///
/// Most tokens use 18 decimals, some stablecoins 6. Raw on-chain amounts are
/// integers; dividing by `10^decimals` gives the human-readable amount.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use alphascan::TokenDecimals;
/// use bigdecimal::BigDecimal;
/// use std::str::FromStr;
///
/// let usdt = TokenDecimals::new(6);
/// let amount = usdt.normalize(U256::from(1_500_000u64));
/// assert_eq!(amount, BigDecimal::from_str("1.5").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenDecimals(u8);

impl TokenDecimals {
    /// Standard decimals for native-like tokens (18)
    pub const STANDARD: Self = Self(18);

    /// Create a new decimal precision value
    pub const fn new(decimals: u8) -> Self {
        Self(decimals)
    }

    /// Get the inner u8 value
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Converts a raw integer amount into an exact decimal amount.
    pub fn normalize(&self, raw: U256) -> BigDecimal {
        BigDecimal::new(to_bigint(raw), i64::from(self.0))
    }
}

impl Default for TokenDecimals {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl From<u8> for TokenDecimals {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TokenDecimals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} decimals", self.0)
    }
}

pub(crate) fn to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_exact() {
        let decimals = TokenDecimals::new(18);
        let raw = U256::from(123_456_789_000_000_000_000u128);
        assert_eq!(
            decimals.normalize(raw),
            BigDecimal::from_str("123.456789").unwrap()
        );
    }

    #[test]
    fn test_normalize_zero_decimals() {
        assert_eq!(
            TokenDecimals::new(0).normalize(U256::from(42u64)),
            BigDecimal::from(42)
        );
    }

    #[test]
    fn test_normalize_max_value_keeps_every_digit() {
        let amount = TokenDecimals::new(0).normalize(U256::MAX);
        assert_eq!(amount.to_string(), U256::MAX.to_string());
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(
            TokenDecimals::STANDARD.normalize(U256::ZERO),
            BigDecimal::from(0)
        );
    }

    #[test]
    fn test_serialization() {
        let decimals = TokenDecimals::new(6);
        let json = serde_json::to_string(&decimals).unwrap();
        assert_eq!(json, "6");
        let deserialized: TokenDecimals = serde_json::from_str(&json).unwrap();
        assert_eq!(decimals, deserialized);
    }
}
