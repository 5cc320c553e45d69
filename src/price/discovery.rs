// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::TxHash;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::map::PriceMap;
use crate::exchange::ExchangeTransaction;

/// Largest tolerated relative gap between an observed swap rate and the rate
/// implied by already-known prices (5%).
pub fn max_rate_deviation() -> BigDecimal {
    BigDecimal::new(5.into(), 2)
}

/// A swap whose rate disagrees with the prices already in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInconsistency {
    /// Swap transaction
    pub hash: TxHash,
    /// Symbol sold
    pub from_symbol: String,
    /// Symbol bought
    pub to_symbol: String,
    /// Amount bought according to the known prices
    pub expected_to_amount: BigDecimal,
    /// Amount actually bought
    pub actual_to_amount: BigDecimal,
    /// `|expected - actual| / actual`
    pub deviation: BigDecimal,
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDiscovery {
    /// Seed prices plus every inferred price
    pub prices: PriceMap,
    /// Swaps whose rates disagree with the known prices by more than 5%
    pub inconsistencies: Vec<PriceInconsistency>,
}

/// Infers prices from `exchanges`, starting from `seed`.
///
/// See [`discover_into`] for the propagation rules.
pub fn discover(exchanges: &[ExchangeTransaction], seed: PriceMap) -> PriceDiscovery {
    let mut prices = seed;
    let inconsistencies = discover_into(&mut prices, exchanges);
    PriceDiscovery {
        prices,
        inconsistencies,
    }
}

/// Propagates known prices through `exchanges` into `prices`.
///
/// Swaps are visited once, in ascending timestamp order (ties keep their input
/// order). For a swap `from -> to`:
///
/// - only `from` priced: `price(to) = from_amount * price(from) / to_amount`
/// - only `to` priced: `price(from) = to_amount * price(to) / from_amount`
/// - both priced: the swap is checked against the implied rate and reported
///   if it deviates by more than 5%; the map is left alone
/// - neither priced: skipped
///
/// A price, once set, is never revised by a later swap.
pub fn discover_into(
    prices: &mut PriceMap,
    exchanges: &[ExchangeTransaction],
) -> Vec<PriceInconsistency> {
    let mut ordered: Vec<&ExchangeTransaction> = exchanges.iter().collect();
    ordered.sort_by_key(|exchange| exchange.timestamp);

    let mut inconsistencies = Vec::new();
    for exchange in ordered {
        if exchange.from_amount <= BigDecimal::zero() || exchange.to_amount <= BigDecimal::zero() {
            continue;
        }

        let from_price = prices.get(&exchange.from_symbol).cloned();
        let to_price = prices.get(&exchange.to_symbol).cloned();
        match (from_price, to_price) {
            (Some(from_price), None) => {
                let price = &exchange.from_amount * &from_price / &exchange.to_amount;
                prices.insert_first(&exchange.to_symbol, price);
            }
            (None, Some(to_price)) => {
                let price = &exchange.to_amount * &to_price / &exchange.from_amount;
                prices.insert_first(&exchange.from_symbol, price);
            }
            (Some(from_price), Some(to_price)) => {
                let expected = &exchange.from_amount * &from_price / &to_price;
                let deviation = (&expected - &exchange.to_amount).abs() / &exchange.to_amount;
                if deviation > max_rate_deviation() {
                    inconsistencies.push(PriceInconsistency {
                        hash: exchange.hash,
                        from_symbol: exchange.from_symbol.clone(),
                        to_symbol: exchange.to_symbol.clone(),
                        expected_to_amount: expected,
                        actual_to_amount: exchange.to_amount.clone(),
                        deviation,
                    });
                }
            }
            (None, None) => {}
        }
    }
    inconsistencies
}
