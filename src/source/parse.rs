//! Field parsers shared by the upstream adapters

use std::str::FromStr;

use alloy_primitives::{Address, TxHash, U256};
use bigdecimal::BigDecimal;
use chrono::DateTime;
use serde_json::Value;

use crate::errors::ApiError;

pub(super) fn decimal_u256(operation: &str, field: &str, raw: &str) -> Result<U256, ApiError> {
    U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {raw:?}: {e}")))
}

pub(super) fn hex_u64(operation: &str, field: &str, raw: &str) -> Result<u64, ApiError> {
    let digits = raw.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {raw:?}: {e}")))
}

pub(super) fn number<T: FromStr>(operation: &str, field: &str, raw: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {raw:?}: {e}")))
}

/// Accepts a JSON number or a numeric string, decimal or `0x`-prefixed hex.
pub(super) fn flexible_u64(operation: &str, field: &str, value: &Value) -> Result<u64, ApiError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ApiError::data_shape(operation, format!("{field} {n} is not a block number"))),
        Value::String(s) if s.starts_with("0x") => hex_u64(operation, field, s),
        Value::String(s) => number(operation, field, s),
        other => Err(ApiError::data_shape(
            operation,
            format!("{field} has unexpected type: {other}"),
        )),
    }
}

pub(super) fn address(operation: &str, field: &str, raw: &str) -> Result<Address, ApiError> {
    Address::from_str(raw.trim())
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {raw:?}: {e}")))
}

pub(super) fn tx_hash(operation: &str, raw: &str) -> Result<TxHash, ApiError> {
    TxHash::from_str(raw.trim())
        .map_err(|e| ApiError::data_shape(operation, format!("hash {raw:?}: {e}")))
}

/// Parses a USD price given as a JSON number or string, keeping every digit.
pub(super) fn usd_price(operation: &str, field: &str, value: &Value) -> Result<BigDecimal, ApiError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(ApiError::data_shape(
                operation,
                format!("{field} has unexpected type: {other}"),
            ))
        }
    };
    BigDecimal::from_str(&text)
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {text:?}: {e}")))
}

pub(super) fn rfc3339_timestamp(operation: &str, field: &str, raw: &str) -> Result<i64, ApiError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.timestamp())
        .map_err(|e| ApiError::data_shape(operation, format!("{field} {raw:?}: {e}")))
}
