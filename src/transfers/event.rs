//! Raw ERC-20 transfer records as reported by the upstream service

use alloy_primitives::{Address, TxHash, U256};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::decimals::TokenDecimals;
use crate::types::wei::WeiAmount;

/// One ERC-20 `Transfer` log, with the gas data of its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransferEvent {
    /// Transaction hash
    pub hash: TxHash,
    /// Position of the log in its block (or in the upstream listing when the
    /// upstream does not report one)
    pub log_index: u64,
    /// Token contract
    pub token: Address,
    /// Sender
    pub from: Address,
    /// Recipient
    pub to: Address,
    /// Upper-case token symbol
    pub symbol: String,
    /// Integer amount in the token's smallest unit
    pub raw_amount: U256,
    /// Token decimals
    pub decimals: TokenDecimals,
    /// Block number
    pub block_number: u64,
    /// Block timestamp (UNIX seconds)
    pub timestamp: i64,
    /// Gas used by the transaction
    pub gas_used: U256,
    /// Effective gas price of the transaction, in wei
    pub gas_price: U256,
}

impl RawTransferEvent {
    /// Exact human-readable amount.
    pub fn amount(&self) -> BigDecimal {
        self.decimals.normalize(self.raw_amount)
    }

    /// Gas cost of the transaction that emitted this transfer.
    pub fn gas_cost(&self) -> WeiAmount {
        WeiAmount::gas_cost(self.gas_used, self.gas_price)
    }

    /// Identity of the log: the same log listed twice has the same key.
    pub fn dedup_key(&self) -> (TxHash, Address, u64) {
        (self.hash, self.token, self.log_index)
    }

    /// Chronological sort key.
    pub(crate) fn order_key(&self) -> (i64, u64, u64) {
        (self.timestamp, self.block_number, self.log_index)
    }
}
