//! Input validation errors.

use chrono::NaiveDate;

/// Errors for malformed user input, raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The wallet address is not a 20-byte hex address.
    #[error("Invalid wallet address: {input}")]
    InvalidWalletAddress {
        /// The rejected input
        input: String,
    },

    /// The date string is not `YYYY-MM-DD`.
    #[error("Invalid date {input} (expected YYYY-MM-DD)")]
    InvalidDate {
        /// The rejected input
        input: String,
    },

    /// The trading day has not started yet.
    #[error("Date {date} has not started yet")]
    FutureDate {
        /// The rejected date
        date: NaiveDate,
    },
}
