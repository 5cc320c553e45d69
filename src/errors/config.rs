//! Error types for configuration problems.
//!
//! Configuration errors are never retried: a batch with an incomplete or ambiguous
//! configuration is aborted before any network call.

/// Errors raised while validating or adapting configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The network has no active credentials.
    #[error("No active API credentials configured for {network}")]
    NoActiveCredentials {
        /// Network name
        network: String,
    },

    /// No trading pairs are configured.
    #[error("No trading pairs configured for {network}")]
    NoTradingPairs {
        /// Network name
        network: String,
    },

    /// A pair references a symbol without a contract address.
    #[error("Token {symbol} used by pair {pair} has no contract address on {network}")]
    MissingTokenAddress {
        /// Network name
        network: String,
        /// Symbol without an address
        symbol: String,
        /// Pair that references the symbol
        pair: String,
    },

    /// A configuration value could not be parsed.
    #[error("Invalid configuration value for {field}: {details}")]
    InvalidValue {
        /// Field that failed to parse
        field: String,
        /// Details about the failure
        details: String,
    },

    /// The configuration document could not be decoded.
    #[error("Failed to decode configuration document: {details}")]
    Document {
        /// Details about the decoding failure
        details: String,
    },
}

impl ConfigError {
    /// Create an `InvalidValue` error.
    pub fn invalid_value(field: impl Into<String>, details: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            details: details.into(),
        }
    }

    /// Create a `Document` error.
    pub fn document(details: impl Into<String>) -> Self {
        ConfigError::Document {
            details: details.into(),
        }
    }
}
