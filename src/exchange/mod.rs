// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Reconstruction of logical swaps from raw transfer events.
//!
//! A swap emits several `Transfer` logs in one transaction: the wallet sends
//! the source token to a router or pool and receives the target token back,
//! sometimes split over several legs. Grouping the wallet's transfers by
//! transaction hash and matching each group against the configured trading
//! pairs recovers one [`ExchangeTransaction`] per swap.
//!
//! Matching is deterministic: groups are visited in first-seen order, pairs in
//! configuration order, and the first pair that matches a group wins.

use std::collections::HashMap;

use alloy_primitives::{Address, TxHash, U256};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::config::TradingPair;
use crate::transfers::RawTransferEvent;
use crate::types::wei::WeiAmount;

/// One reconstructed swap: `from_amount` of `from_symbol` sold for
/// `to_amount` of `to_symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTransaction {
    /// Transaction hash
    pub hash: TxHash,
    /// Symbol sold
    pub from_symbol: String,
    /// Symbol bought
    pub to_symbol: String,
    /// Total amount of `from_symbol` the wallet sent in the transaction
    pub from_amount: BigDecimal,
    /// Total amount of `to_symbol` the wallet received in the transaction
    pub to_amount: BigDecimal,
    /// Block number
    pub block_number: u64,
    /// Block timestamp (UNIX seconds)
    pub timestamp: i64,
    /// Gas used by the transaction
    pub gas_used: U256,
    /// Effective gas price, in wei
    pub gas_price: U256,
}

impl ExchangeTransaction {
    /// Gas paid for the swap.
    pub fn gas_cost(&self) -> WeiAmount {
        WeiAmount::gas_cost(self.gas_used, self.gas_price)
    }

    /// Units of `to_symbol` received per unit of `from_symbol`, if defined.
    pub fn rate(&self) -> Option<BigDecimal> {
        if self.from_amount.is_zero() {
            return None;
        }
        Some(&self.to_amount / &self.from_amount)
    }
}

/// Groups `transfers` by hash, preserving the order in which hashes first appear.
fn group_by_hash(transfers: &[RawTransferEvent]) -> Vec<(TxHash, Vec<&RawTransferEvent>)> {
    let mut positions: HashMap<TxHash, usize> = HashMap::new();
    let mut groups: Vec<(TxHash, Vec<&RawTransferEvent>)> = Vec::new();
    for transfer in transfers {
        let position = *positions.entry(transfer.hash).or_insert_with(|| {
            groups.push((transfer.hash, Vec::new()));
            groups.len() - 1
        });
        groups[position].1.push(transfer);
    }
    groups
}

/// Sum of `symbol` amounts moving in one direction relative to `wallet`.
fn directed_sum(
    legs: &[&RawTransferEvent],
    symbol: &str,
    is_leg: impl Fn(&RawTransferEvent) -> bool,
) -> BigDecimal {
    legs.iter()
        .copied()
        .filter(|t| t.symbol.eq_ignore_ascii_case(symbol) && is_leg(*t))
        .fold(BigDecimal::zero(), |acc, t| acc + t.amount())
}

fn match_pair(
    wallet: Address,
    hash: TxHash,
    legs: &[&RawTransferEvent],
    pair: &TradingPair,
) -> Option<ExchangeTransaction> {
    if pair.from.eq_ignore_ascii_case(&pair.to) {
        return None;
    }

    let sent = directed_sum(legs, &pair.from, |t| t.from == wallet);
    if sent <= BigDecimal::zero() {
        return None;
    }
    let received = directed_sum(legs, &pair.to, |t| t.to == wallet);
    if received <= BigDecimal::zero() {
        return None;
    }

    // Gas is per transaction, so any leg carries the same values
    let first = legs.first()?;
    Some(ExchangeTransaction {
        hash,
        from_symbol: pair.from.clone(),
        to_symbol: pair.to.clone(),
        from_amount: sent,
        to_amount: received,
        block_number: first.block_number,
        timestamp: first.timestamp,
        gas_used: first.gas_used,
        gas_price: first.gas_price,
    })
}

/// Reconstructs `wallet`'s swaps from its transfers.
///
/// For every transaction hash, the configured `pairs` are tried in order. A
/// pair `from -> to` matches when, within that transaction, the wallet sent a
/// positive total of `from` and received a positive total of `to`. The first
/// matching pair wins; a hash yields at most one exchange, and hashes that
/// match no pair yield none.
///
/// # Examples
///
/// ```rust,ignore
/// use alphascan::{exchange, TradingPair};
///
/// let pairs = vec![TradingPair::new("USDT", "TOKEN"), TradingPair::new("TOKEN", "USDT")];
/// let swaps = exchange::reconstruct(wallet, &transfers, &pairs);
/// ```
pub fn reconstruct(
    wallet: Address,
    transfers: &[RawTransferEvent],
    pairs: &[TradingPair],
) -> Vec<ExchangeTransaction> {
    group_by_hash(transfers)
        .into_iter()
        .filter_map(|(hash, legs)| {
            pairs
                .iter()
                .find_map(|pair| match_pair(wallet, hash, &legs, pair))
        })
        .collect()
}
