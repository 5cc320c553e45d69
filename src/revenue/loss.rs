// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Trading loss, gas loss and valid volume of a set of swaps.

use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::exchange::ExchangeTransaction;
use crate::price::PriceMap;
use crate::types::wei::WeiAmount;

/// Loss and volume figures for one wallet's swaps, in USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossSummary {
    /// `sum(sold x price) - sum(bought x price)`; positive is value given up
    pub trading_loss: BigDecimal,
    /// Gas paid, valued at the native price
    pub gas_loss: BigDecimal,
    /// Value sold in swaps whose target is not a stablecoin
    pub valid_volume: BigDecimal,
    /// Total sold per symbol, in token units
    pub sold: BTreeMap<String, BigDecimal>,
    /// Total bought per symbol, in token units
    pub bought: BTreeMap<String, BigDecimal>,
    /// Gas paid, in native units
    pub gas_native: BigDecimal,
    /// `valid_volume` broken down by the symbol bought
    pub valid_volume_by_target: BTreeMap<String, BigDecimal>,
}

impl Default for LossSummary {
    fn default() -> Self {
        Self {
            trading_loss: BigDecimal::zero(),
            gas_loss: BigDecimal::zero(),
            valid_volume: BigDecimal::zero(),
            sold: BTreeMap::new(),
            bought: BTreeMap::new(),
            gas_native: BigDecimal::zero(),
            valid_volume_by_target: BTreeMap::new(),
        }
    }
}

impl LossSummary {
    /// `trading_loss + gas_loss`.
    pub fn total_loss(&self) -> BigDecimal {
        &self.trading_loss + &self.gas_loss
    }
}

fn add_to(totals: &mut BTreeMap<String, BigDecimal>, symbol: &str, amount: &BigDecimal) {
    let entry = totals.entry(symbol.to_string()).or_insert_with(BigDecimal::zero);
    *entry += amount;
}

fn value_of(totals: &BTreeMap<String, BigDecimal>, prices: &PriceMap) -> BigDecimal {
    totals
        .iter()
        .fold(BigDecimal::zero(), |acc, (symbol, amount)| {
            acc + amount * prices.price_or_zero(symbol)
        })
}

/// Computes loss and volume figures for `exchanges`.
///
/// Unpriced symbols count as zero. A swap counts toward valid volume only when
/// the symbol bought is not one of `stablecoins`.
pub fn compute(
    exchanges: &[ExchangeTransaction],
    prices: &PriceMap,
    stablecoins: &[String],
    native_price: &BigDecimal,
) -> LossSummary {
    let mut summary = LossSummary::default();
    let mut gas = WeiAmount::ZERO;

    for exchange in exchanges {
        add_to(&mut summary.sold, &exchange.from_symbol, &exchange.from_amount);
        add_to(&mut summary.bought, &exchange.to_symbol, &exchange.to_amount);
        gas = gas + exchange.gas_cost();

        let is_stable_target = stablecoins
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&exchange.to_symbol));
        if !is_stable_target {
            let value = &exchange.from_amount * prices.price_or_zero(&exchange.from_symbol);
            add_to(&mut summary.valid_volume_by_target, &exchange.to_symbol, &value);
            summary.valid_volume += value;
        }
    }

    summary.trading_loss = value_of(&summary.sold, prices) - value_of(&summary.bought, prices);
    summary.gas_native = gas.to_native();
    summary.gas_loss = &summary.gas_native * native_price;
    summary
}
