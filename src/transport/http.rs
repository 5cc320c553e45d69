// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport as a Tower service.
//!
//! Requests are fully described by a [`KeyedRequest`] (URL, query, headers), with
//! the API key already placed by the adapter that built it. [`HttpTransport`] sends
//! them with `reqwest` under a per-request timeout and hands back status and body;
//! status interpretation happens in [`HttpResponse::error_for_status`].

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use reqwest::Client;
use url::Url;

use crate::errors::ApiError;

/// Longest response body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// A GET request against the upstream chain-data service.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyedRequest {
    /// Short label used in logs and error messages (e.g. `account/tokentx`)
    pub operation: String,
    /// Endpoint URL without query string
    pub url: Url,
    /// Query parameters in order
    pub query: Vec<(String, String)>,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl KeyedRequest {
    /// Creates a request with no query parameters or headers.
    pub fn new(operation: impl Into<String>, url: Url) -> Self {
        Self {
            operation: operation.into(),
            url,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the value of the first query parameter named `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

// Keys travel in query parameters or headers, so neither is printed.
impl std::fmt::Debug for KeyedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedRequest")
            .field("operation", &self.operation)
            .field("url", &self.url.as_str())
            .field("query_params", &self.query.len())
            .field("headers", &self.headers.len())
            .finish()
    }
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Maps non-success status codes to typed errors.
    ///
    /// `429` is a rate limit, `401`/`403` a rejected key, anything else outside
    /// `2xx` a plain HTTP error.
    pub fn error_for_status(self, operation: &str) -> Result<Self, ApiError> {
        match self.status {
            200..=299 => Ok(self),
            429 => Err(ApiError::RateLimited {
                operation: operation.to_string(),
                message: truncate(&self.body),
            }),
            401 | 403 => Err(ApiError::InvalidKey {
                operation: operation.to_string(),
                message: truncate(&self.body),
            }),
            status => Err(ApiError::Http {
                operation: operation.to_string(),
                status,
                body: truncate(&self.body),
            }),
        }
    }

    /// Decodes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self, operation: &str) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::data_shape(operation, e.to_string()))
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        truncated.push_str("...");
        truncated
    }
}

/// Sends [`KeyedRequest`]s over HTTP with a per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport("building HTTP client", e))?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl tower::Service<KeyedRequest> for HttpTransport {
    type Response = HttpResponse;
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: KeyedRequest) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let mut builder = client.get(request.url.clone()).query(&request.query);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| classify(&request.operation, e))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| classify(&request.operation, e))?;

            Ok(HttpResponse { status, body })
        })
    }
}

fn classify(operation: &str, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(operation)
    } else {
        ApiError::transport(operation, error)
    }
}
