// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for upstream HTTP requests.
//!
//! Wraps each request in a `tracing` span and records timing, status and errors.
//! Query values and headers are never logged since they may carry API keys.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

use super::http::{HttpResponse, KeyedRequest};
use crate::errors::ApiError;

/// A Tower layer that adds logging to upstream requests.
///
/// # Example
///
/// ```rust,ignore
/// use alphascan::transport::{HttpTransport, LoggingLayer};
/// use tower::Layer;
///
/// let service = LoggingLayer::new().layer(HttpTransport::new(timeout)?);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    /// Whether to log response bodies (can be verbose)
    log_responses: bool,
}

impl LoggingLayer {
    /// Creates a new logging layer that records timing and errors only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables logging of response bodies at `trace` level.
    ///
    /// Warning: transfer listings can be very large.
    pub fn with_response_logging(mut self) -> Self {
        self.log_responses = true;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_responses: self.log_responses,
        }
    }
}

/// A Tower service that logs upstream requests and responses.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_responses: bool,
}

impl<S> tower::Service<KeyedRequest> for LoggingService<S>
where
    S: tower::Service<KeyedRequest, Response = HttpResponse, Error = ApiError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = HttpResponse;
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: KeyedRequest) -> Self::Future {
        let log_responses = self.log_responses;
        let mut service = self.service.clone();
        let operation = request.operation.clone();

        let span = tracing::info_span!(
            "upstream_call",
            operation = %operation,
            host = request.url.host_str().unwrap_or_default(),
            duration_ms = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                debug!("Upstream request: {operation}");

                let result = service.call(request).await;
                let duration = start.elapsed();
                tracing::Span::current().record("duration_ms", duration.as_millis() as u64);

                match &result {
                    Ok(response) => {
                        if log_responses {
                            trace!(
                                status = response.status,
                                body = %response.body,
                                duration_ms = %duration.as_millis(),
                                "Upstream response"
                            );
                        } else {
                            debug!(
                                status = response.status,
                                duration_ms = %duration.as_millis(),
                                "Upstream response: {operation}"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            duration_ms = %duration.as_millis(),
                            "Upstream error: {operation}"
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
