//! Configuration for alphascan operations
//!
//! Two layers of configuration exist:
//!
//! - [`AlphascanConfig`]: engine-wide settings (HTTP timeout, dispatch pacing, retry,
//!   page size, points rules), built with [`AlphascanConfigBuilder`]
//! - [`NetworkConfig`]: everything specific to one network (chain, API endpoint,
//!   trading pairs, stablecoins, tracked tokens, trading-day boundary, credentials),
//!   usually decoded from a versioned JSON document via [`NetworkConfigDocument`]
//!
//! # Example: Using defaults
//!
//! ```rust
//! use alphascan::AlphascanConfig;
//!
//! let config = AlphascanConfig::default();
//! assert_eq!(config.page_size, 10_000);
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use alphascan::AlphascanConfigBuilder;
//! use std::time::Duration;
//!
//! let config = AlphascanConfigBuilder::with_defaults()
//!     .http_timeout(Duration::from_secs(10))
//!     .base_interval(Duration::from_millis(100))
//!     .build();
//! ```
//!
//! # Example: Tests and premium endpoints (no pacing, no retry)
//!
//! ```rust
//! use alphascan::AlphascanConfig;
//!
//! let config = AlphascanConfig::minimal();
//! assert_eq!(config.retry.max_attempts, 1);
//! ```

use std::time::Duration;

use crate::revenue::points::PointsConfig;
use crate::transport::RetryPolicy;

pub mod constants;
mod network;
mod schema;

pub use network::{
    ApiEndpoint, ApiFlavor, NetworkConfig, TrackedToken, TradingDayBoundary, TradingPair,
};
pub use schema::{NetworkConfigDocument, NetworkConfigV1, NetworkConfigV2};

/// Engine-wide configuration
///
/// Use [`AlphascanConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct AlphascanConfig {
    /// Timeout for each upstream HTTP request
    /// Default: 30 seconds
    pub http_timeout: Duration,

    /// Lower bound for the spacing between dispatches, whatever the key count
    /// Default: 200ms
    pub base_interval: Duration,

    /// Retry policy for upstream requests
    /// Default: 3 attempts, exponential backoff from 500ms
    pub retry: RetryPolicy,

    /// Records requested per page when listing transfers
    /// Default: 10,000 (the explorer maximum)
    pub page_size: u32,

    /// Balance tiers and promotion multipliers
    pub points: PointsConfig,
}

impl Default for AlphascanConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl AlphascanConfig {
    /// Create config with defaults suited to the public explorer and indexer APIs
    pub fn with_common_defaults() -> Self {
        Self {
            http_timeout: Duration::from_secs(constants::DEFAULT_HTTP_TIMEOUT_SECS),
            base_interval: Duration::from_millis(constants::DEFAULT_BASE_INTERVAL_MS),
            retry: RetryPolicy::default(),
            page_size: constants::MAX_PAGE_SIZE,
            points: PointsConfig::default(),
        }
    }

    /// Create minimal config with no pacing floor and no retries
    ///
    /// Suitable for testing. The per-key dispatch budget still applies.
    pub fn minimal() -> Self {
        Self {
            http_timeout: Duration::from_secs(constants::DEFAULT_HTTP_TIMEOUT_SECS),
            base_interval: Duration::ZERO,
            retry: RetryPolicy::no_retry(),
            page_size: constants::MAX_PAGE_SIZE,
            points: PointsConfig::default(),
        }
    }
}

/// Builder for [`AlphascanConfig`]
///
/// # Example
///
/// ```rust
/// use alphascan::{AlphascanConfigBuilder, RetryPolicy};
/// use std::time::Duration;
///
/// let config = AlphascanConfigBuilder::new()
///     .retry(RetryPolicy::linear(5, Duration::from_secs(1)))
///     .page_size(1_000)
///     .build();
/// assert_eq!(config.page_size, 1_000);
/// ```
pub struct AlphascanConfigBuilder {
    config: AlphascanConfig,
}

impl Default for AlphascanConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphascanConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: AlphascanConfig::minimal(),
        }
    }

    /// Start with common defaults
    pub fn with_defaults() -> Self {
        Self {
            config: AlphascanConfig::with_common_defaults(),
        }
    }

    /// Set the per-request HTTP timeout
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Set the minimum spacing between dispatches
    pub fn base_interval(mut self, interval: Duration) -> Self {
        self.config.base_interval = interval;
        self
    }

    /// Set the retry policy for upstream requests
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the transfer page size, clamped to `1..=10_000`
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size.clamp(1, constants::MAX_PAGE_SIZE);
        self
    }

    /// Set the points rules
    pub fn points(mut self, points: PointsConfig) -> Self {
        self.config.points = points;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AlphascanConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlphascanConfig::default();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.base_interval, Duration::from_millis(200));
        assert_eq!(config.page_size, 10_000);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_minimal_config() {
        let config = AlphascanConfig::minimal();
        assert_eq!(config.base_interval, Duration::ZERO);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_overrides() {
        let config = AlphascanConfigBuilder::with_defaults()
            .http_timeout(Duration::from_secs(5))
            .base_interval(Duration::from_millis(50))
            .build();
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.base_interval, Duration::from_millis(50));
        assert_eq!(config.page_size, 10_000);
    }

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(AlphascanConfigBuilder::new().page_size(0).build().page_size, 1);
        assert_eq!(
            AlphascanConfigBuilder::new().page_size(50_000).build().page_size,
            10_000
        );
    }
}
