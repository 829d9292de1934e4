// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! The transport seam consumed by the instrumentation layer.
//!
//! The layer only needs one operation from the underlying HTTP stack:
//! perform a request and report status, headers, body and timing. It never
//! touches connection handling, TLS or socket-level retries.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

/// Response of one performed HTTP request, as reported by the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Wall time the transport spent on the request.
    pub duration: Duration,
}

/// Failure of the underlying HTTP operation.
///
/// Instrumentation passes these through to the caller unchanged; the only
/// added behavior is that the span is finalized with an error status first.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("i/o error while talking to {url}: {reason}")]
    Io { url: String, reason: String },
}

/// The raw HTTP operation the instrumented client delegates to.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
    ) -> Result<HttpResponse, TransportError>;
}
