//! Validation of user-supplied wallets and dates.

use std::str::FromStr;

use alloy_primitives::Address;
use chrono::NaiveDate;

use crate::errors::ValidationError;

/// Parses a `0x`-prefixed 20-byte hex wallet address.
///
/// # Examples
///
/// ```rust
/// use alphascan::parse_wallet;
///
/// assert!(parse_wallet("0x1111111111111111111111111111111111111111").is_ok());
/// assert!(parse_wallet("1111111111111111111111111111111111111111").is_err());
/// assert!(parse_wallet("0x1234").is_err());
/// ```
pub fn parse_wallet(input: &str) -> Result<Address, ValidationError> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") {
        return Err(ValidationError::InvalidWalletAddress {
            input: input.to_string(),
        });
    }
    Address::from_str(trimmed).map_err(|_| ValidationError::InvalidWalletAddress {
        input: input.to_string(),
    })
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Examples
///
/// ```rust
/// use alphascan::parse_query_date;
///
/// assert!(parse_query_date("2025-06-01").is_ok());
/// assert!(parse_query_date("2025-02-30").is_err());
/// assert!(parse_query_date("06/01/2025").is_err());
/// ```
pub fn parse_query_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        input: input.to_string(),
    })
}
