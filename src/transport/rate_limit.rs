// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Key-aware dispatch pacing for upstream requests.
//!
//! [`KeyedRateLimiter`] spaces the *start* of consecutive dispatches by
//! `max(base_interval, 1s / active_keys)`. Waiters queue on a fair mutex, so
//! dispatches leave in arrival order. The limiter does not bound how many requests
//! are awaiting a response at the same time.
//!
//! The same limiter is available as a Tower `Layer` ([`RateLimitLayer`]) so it
//! composes with the HTTP transport service.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tower::Layer;
use tracing::trace;

/// One second, shared across all active keys.
const KEY_BUDGET: Duration = Duration::from_secs(1);

/// Paces request dispatches according to the number of active API keys.
///
/// # Example
///
/// ```rust
/// use alphascan::transport::KeyedRateLimiter;
/// use std::time::Duration;
///
/// // Four active keys: one dispatch every 250ms at most
/// let limiter = KeyedRateLimiter::fixed(Duration::from_millis(100), 4);
/// assert_eq!(limiter.min_interval(), Duration::from_millis(250));
/// ```
#[derive(Debug)]
pub struct KeyedRateLimiter {
    /// Start time of the most recent dispatch
    last_dispatch: Mutex<Option<Instant>>,
    /// Lower bound for the interval regardless of key count
    base_interval: Duration,
    /// Number of active keys, published by the key pool
    active_keys: watch::Receiver<usize>,
}

impl KeyedRateLimiter {
    /// Creates a limiter that follows the active key count published by a pool.
    pub fn new(base_interval: Duration, active_keys: watch::Receiver<usize>) -> Self {
        Self {
            last_dispatch: Mutex::new(None),
            base_interval,
            active_keys,
        }
    }

    /// Creates a limiter with a fixed active key count.
    pub fn fixed(base_interval: Duration, active_keys: usize) -> Self {
        let (_, receiver) = watch::channel(active_keys);
        Self::new(base_interval, receiver)
    }

    /// Current minimum spacing between dispatch starts.
    pub fn min_interval(&self) -> Duration {
        let keys = (*self.active_keys.borrow()).max(1) as u32;
        self.base_interval.max(KEY_BUDGET / keys)
    }

    /// Waits for this caller's dispatch slot.
    ///
    /// Holding the queue lock across the sleep keeps the queue FIFO.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval();
            let now = Instant::now();
            if ready_at > now {
                trace!(wait_ms = (ready_at - now).as_millis() as u64, "Pacing dispatch");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Runs `f` once this caller's dispatch slot arrives.
    ///
    /// The queue is released as soon as `f` starts, so slow responses never hold up
    /// the next dispatch.
    pub async fn execute<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        f().await
    }
}

/// A Tower layer that paces requests through a shared [`KeyedRateLimiter`].
///
/// # Example
///
/// ```rust,ignore
/// use alphascan::transport::{HttpTransport, KeyedRateLimiter, RateLimitLayer};
/// use std::{sync::Arc, time::Duration};
/// use tower::Layer;
///
/// let limiter = Arc::new(KeyedRateLimiter::new(Duration::from_millis(200), pool.subscribe_active_count()));
/// let service = RateLimitLayer::new(limiter).layer(HttpTransport::new(Duration::from_secs(30))?);
/// ```
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    limiter: Arc<KeyedRateLimiter>,
}

impl RateLimitLayer {
    /// Creates a layer around a shared limiter.
    pub fn new(limiter: Arc<KeyedRateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            service,
            limiter: self.limiter.clone(),
        }
    }
}

/// A Tower service that paces requests through a [`KeyedRateLimiter`].
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    service: S,
    limiter: Arc<KeyedRateLimiter>,
}

impl<S, Request> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut service = self.service.clone();

        Box::pin(async move {
            limiter.acquire().await;
            service.call(request).await
        })
    }
}
