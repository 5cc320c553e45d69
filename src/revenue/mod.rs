//! Per-wallet revenue analysis.
//!
//! [`RevenueOrchestrator`] drives the pipeline for a batch of wallets:
//! block range, transfers, swap reconstruction, price discovery, then
//! [`loss::compute`] and [`PointsConfig`] for the figures reported in each
//! [`WalletRevenueSnapshot`].

mod input;
pub mod loss;
mod orchestrator;
pub mod points;
mod snapshot;

pub use input::{parse_query_date, parse_wallet};
pub use loss::LossSummary;
pub use orchestrator::RevenueOrchestrator;
pub use points::{volume_points, BalanceTier, PointsConfig, PointsEstimate, PromotionWindow};
pub use snapshot::{SnapshotOutcome, TransactionSummary, WalletRevenueSnapshot};
