// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream client: key rotation, pacing and retry around one transport service.
//!
//! Every attempt of a request picks a fresh credential from the [`ApiKeyPool`], so
//! a retry after a throttled or rejected key lands on the next key. The outcome of
//! each attempt, including response parsing, is recorded against the key that was
//! used.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tower::Layer;
use tracing::{debug, warn};

use super::http::{HttpResponse, HttpTransport, KeyedRequest};
use super::logging::{LoggingLayer, LoggingService};
use super::rate_limit::{KeyedRateLimiter, RateLimitLayer, RateLimitService};
use super::retry::RetryPolicy;
use crate::clock::{Clock, SystemClock};
use crate::errors::ApiError;
use crate::keys::{ApiKeyPool, SelectedCredential};

/// The production service stack: pacing, then logging, then HTTP.
pub type DefaultTransport = RateLimitService<LoggingService<HttpTransport>>;

/// Client for one upstream service, generic over the transport service.
#[derive(Clone)]
pub struct UpstreamClient<S = DefaultTransport> {
    service: S,
    pool: Arc<ApiKeyPool>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl UpstreamClient<DefaultTransport> {
    /// Builds the production stack: an HTTP transport with `timeout`, logged and
    /// paced by a limiter that follows the pool's active key count.
    pub fn http(
        pool: Arc<ApiKeyPool>,
        timeout: Duration,
        base_interval: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let limiter = Arc::new(KeyedRateLimiter::new(
            base_interval,
            pool.subscribe_active_count(),
        ));
        let service = RateLimitLayer::new(limiter)
            .layer(LoggingLayer::new().layer(HttpTransport::new(timeout)?));
        Ok(Self::new(service, pool, retry))
    }
}

impl<S> UpstreamClient<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    /// Creates a client over an arbitrary transport service, using the system clock.
    pub fn new(service: S, pool: Arc<ApiKeyPool>, retry: RetryPolicy) -> Self {
        Self {
            service,
            pool,
            retry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for backoff sleeps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The key pool this client rotates through.
    pub fn pool(&self) -> &Arc<ApiKeyPool> {
        &self.pool
    }

    /// The client's default retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends one logical request, retrying per the client's policy.
    ///
    /// `build` places the selected key into the request; `parse` turns the response
    /// body into a value. A parse failure is an attempt failure like any other.
    pub async fn request<T, B, P>(&self, operation: &str, build: B, parse: P) -> Result<T, ApiError>
    where
        B: Fn(&SelectedCredential) -> KeyedRequest + Send + Sync,
        P: Fn(HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        self.request_with(self.retry, operation, build, parse).await
    }

    /// Sends one logical request under `retry` instead of the client's policy.
    ///
    /// Callers that run their own retry loop pass [`RetryPolicy::no_retry`].
    pub async fn request_with<T, B, P>(
        &self,
        retry: RetryPolicy,
        operation: &str,
        build: B,
        parse: P,
    ) -> Result<T, ApiError>
    where
        B: Fn(&SelectedCredential) -> KeyedRequest + Send + Sync,
        P: Fn(HttpResponse) -> Result<T, ApiError> + Send + Sync,
        T: Send,
    {
        let mut attempt = 1u32;
        loop {
            let credential = self.pool.next().ok_or(ApiError::NoActiveCredentials)?;
            let started = Instant::now();

            let outcome = match self.dispatch(build(&credential)).await {
                Ok(response) => response.error_for_status(operation).and_then(&parse),
                Err(error) => Err(error),
            };

            match outcome {
                Ok(value) => {
                    self.pool.record_success(&credential.key, started.elapsed());
                    if attempt > 1 {
                        debug!(operation, attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if error.counts_against_key() {
                        self.pool.record_failure(&credential.key);
                    }
                    if !error.is_retryable() {
                        debug!(operation, error = %error, "Non-retryable error, not retrying");
                        return Err(error);
                    }
                    if !retry.should_retry(attempt) {
                        warn!(operation, error = %error, attempts = attempt, "Max attempts exceeded");
                        return Err(error);
                    }

                    let delay = retry.delay_after(attempt);
                    warn!(
                        operation,
                        key = %credential.masked_key(),
                        error = %error,
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retryable error, backing off"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn dispatch(&self, request: KeyedRequest) -> Result<HttpResponse, ApiError> {
        let mut service = self.service.clone();
        futures::future::poll_fn(|cx| service.poll_ready(cx)).await?;
        service.call(request).await
    }
}
