// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for native currency amounts
//!
//! Gas costs are accumulated in wei and only converted to native units (and then
//! USD) at the end, so the sum stays exact.

use std::iter::Sum;
use std::ops::Add;

use alloy_primitives::U256;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::decimals::TokenDecimals;

/// Represents an amount of native currency (ETH, BNB, ...) in wei
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use alphascan::WeiAmount;
/// use bigdecimal::BigDecimal;
/// use std::str::FromStr;
///
/// // 21,000 gas at 5 gwei
/// let cost = WeiAmount::gas_cost(U256::from(21_000u64), U256::from(5_000_000_000u64));
/// assert_eq!(cost.to_native(), BigDecimal::from_str("0.000105").unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct WeiAmount(U256);

impl WeiAmount {
    /// Zero wei amount
    pub const ZERO: Self = Self(U256::ZERO);

    /// Create a new wei amount
    pub const fn new(wei: U256) -> Self {
        Self(wei)
    }

    /// Cost of a transaction: `gas_used * gas_price`, saturating at `U256::MAX`.
    pub fn gas_cost(gas_used: U256, gas_price: U256) -> Self {
        Self(gas_used.saturating_mul(gas_price))
    }

    /// Get the inner U256 value (in wei)
    pub const fn as_u256(&self) -> U256 {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Exact amount in native units (`wei / 10^18`).
    pub fn to_native(&self) -> BigDecimal {
        TokenDecimals::STANDARD.normalize(self.0)
    }
}

impl From<u64> for WeiAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for WeiAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl Add for WeiAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for WeiAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for WeiAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
