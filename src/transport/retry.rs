// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Retry policy with linear or exponential backoff.
//!
//! The policy only computes *when* to retry; sleeping goes through an injected
//! [`Clock`](crate::Clock), so backoff schedules are testable without delays.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;

/// Default maximum number of attempts (including the first one).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base delay for exponential backoff (500ms).
const DEFAULT_BASE_DELAY_MS: u64 = 500;
/// Default maximum delay between retries (30 seconds).
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Step used by block lookups: `attempt x 1000ms`.
const BLOCK_LOOKUP_STEP_MS: u64 = 1_000;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `delay = step x attempt` (attempt is 1-based).
    Linear {
        /// Delay added per attempt
        step: Duration,
    },
    /// `delay = min(base x 2^(attempt - 1), max)` (attempt is 1-based).
    Exponential {
        /// Delay after the first failure
        base: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
}

/// Retry configuration: how many attempts and how long to wait between them.
///
/// # Examples
///
/// ```rust
/// use alphascan::transport::{Backoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::linear(3, Duration::from_secs(1));
/// assert_eq!(policy.delay_after(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_after(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay growth between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
                max: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            },
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with linear backoff.
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Linear { step },
        }
    }

    /// Creates a policy with exponential backoff.
    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base, max },
        }
    }

    /// The policy used for timestamp-to-block lookups: 3 attempts, `attempt x 1000ms`.
    pub fn block_lookup() -> Self {
        Self::linear(3, Duration::from_millis(BLOCK_LOOKUP_STEP_MS))
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Linear {
                step: Duration::ZERO,
            },
        }
    }

    /// Returns `true` if another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear { step } => step.saturating_mul(attempt),
            Backoff::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1);
                let multiplier = 2u64.saturating_pow(exponent);
                let delay_ms = base.as_millis().saturating_mul(multiplier as u128);
                let capped = delay_ms.min(max.as_millis()) as u64;
                Duration::from_millis(capped)
            }
        }
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted, sleeping on `clock` between attempts.
///
/// `operation` receives the 1-based attempt number.
pub async fn retry_with<T, E, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    label: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    debug!(label, error = %error, "Non-retryable error, not retrying");
                    return Err(error);
                }
                if !policy.should_retry(attempt) {
                    warn!(label, error = %error, attempts = attempt, "Max attempts exceeded");
                    return Err(error);
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    label,
                    error = %error,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retryable error, backing off"
                );
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
