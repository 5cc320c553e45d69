// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transport layer for the upstream chain-data service.
//!
//! The HTTP transport is a Tower service, so pacing and logging compose as layers:
//!
//! ```text
//! UpstreamClient (key rotation + retry)
//!   -> RateLimitLayer (KeyedRateLimiter)
//!     -> LoggingLayer
//!       -> HttpTransport (reqwest, per-request timeout)
//! ```
//!
//! # Rate Limiting
//!
//! The [`KeyedRateLimiter`] spaces dispatches by `max(base, 1s / active_keys)` and
//! follows the active key count published by the [`ApiKeyPool`](crate::ApiKeyPool).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alphascan::transport::{RetryPolicy, UpstreamClient};
//! use std::time::Duration;
//!
//! let client = UpstreamClient::http(
//!     pool,
//!     Duration::from_secs(30),
//!     Duration::from_millis(200),
//!     RetryPolicy::default(),
//! )?;
//! ```

mod client;
mod http;
mod logging;
mod rate_limit;
mod retry;

pub use client::{DefaultTransport, UpstreamClient};
pub use http::{HttpResponse, HttpTransport, KeyedRequest};
pub use logging::{LoggingLayer, LoggingService};
pub use rate_limit::{KeyedRateLimiter, RateLimitLayer, RateLimitService};
pub use retry::{retry_with, Backoff, RetryPolicy};
