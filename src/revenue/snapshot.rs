//! Per-wallet analysis results.

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::loss::LossSummary;
use super::points::PointsEstimate;
use crate::exchange::ExchangeTransaction;

/// Everything computed for one wallet on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Trading loss, gas loss and valid volume
    #[serde(flatten)]
    pub loss: LossSummary,
    /// `trading_loss + gas_loss`
    pub total_loss: BigDecimal,
    /// Points estimate from holdings and valid volume
    pub points: PointsEstimate,
    /// Raw transfers seen in the block range
    pub transfer_count: usize,
    /// Reconstructed swaps, in first-seen order
    pub exchanges: Vec<ExchangeTransaction>,
    /// Traded symbols that had no price, valued at zero
    pub unpriced_symbols: Vec<String>,
}

/// Outcome of one wallet's analysis: a summary or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOutcome {
    /// The analysis completed
    Summary(Box<TransactionSummary>),
    /// The analysis failed with this message
    Error(String),
}

/// Result for one wallet of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRevenueSnapshot {
    /// Wallet as given by the caller
    pub wallet_address: String,
    /// Trading day analyzed
    pub query_date: NaiveDate,
    /// USD value of the native and tracked token holdings; zero on error
    pub tokens_value: BigDecimal,
    /// Summary or error
    #[serde(flatten)]
    pub outcome: SnapshotOutcome,
}

impl WalletRevenueSnapshot {
    /// A successful snapshot.
    pub fn completed(
        wallet_address: impl Into<String>,
        query_date: NaiveDate,
        tokens_value: BigDecimal,
        summary: TransactionSummary,
    ) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            query_date,
            tokens_value,
            outcome: SnapshotOutcome::Summary(Box::new(summary)),
        }
    }

    /// A failed snapshot with every figure zeroed.
    pub fn failed(
        wallet_address: impl Into<String>,
        query_date: NaiveDate,
        error: impl Into<String>,
    ) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            query_date,
            tokens_value: BigDecimal::zero(),
            outcome: SnapshotOutcome::Error(error.into()),
        }
    }

    /// The summary, if the analysis completed.
    pub fn summary(&self) -> Option<&TransactionSummary> {
        match &self.outcome {
            SnapshotOutcome::Summary(summary) => Some(summary.as_ref()),
            SnapshotOutcome::Error(_) => None,
        }
    }

    /// The error message, if the analysis failed.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SnapshotOutcome::Summary(_) => None,
            SnapshotOutcome::Error(message) => Some(message),
        }
    }

    /// Whether the analysis failed.
    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}
