// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! The instrumented HTTP client handed to scripts.
//!
//! [`InstrumentedClient`] exposes the same request methods, parameter
//! shapes and defaults as the raw client it wraps, so existing scripts
//! run unmodified. It is explicit composition, not interception: the
//! caller substitutes it for the raw client, and every call delegates to
//! the wrapped [`HttpTransport`] after augmenting the outgoing headers.
//!
//! Header priority on a name collision, highest first: trace context
//! headers, caller-supplied headers, configured baggage.

use bytes::Bytes;
use http::{HeaderMap, Method};
use tracing::debug;

use tempest_trace_context::{decide, TraceContext};

use crate::installer::Instrumentation;
use crate::recorder::SpanOutcome;
use crate::transport::{HttpResponse, HttpTransport, TransportError};

/// Per-call parameters, mirroring the raw client's `params` argument.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub headers: HeaderMap,
}

impl RequestParams {
    pub fn with_headers(headers: HeaderMap) -> Self {
        RequestParams { headers }
    }
}

/// Tracing wrapper around one [`HttpTransport`].
///
/// Cheap to clone when the transport is; all instrumentation state lives
/// behind the shared [`Instrumentation`].
#[derive(Debug, Clone)]
pub struct InstrumentedClient<T> {
    transport: T,
    shared: Instrumentation,
}

impl<T: HttpTransport> InstrumentedClient<T> {
    pub(crate) fn new(transport: T, shared: Instrumentation) -> Self {
        InstrumentedClient { transport, shared }
    }

    pub async fn get(
        &self,
        url: &str,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::GET, url, None, params).await
    }

    pub async fn head(
        &self,
        url: &str,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::HEAD, url, None, params).await
    }

    pub async fn del(
        &self,
        url: &str,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::DELETE, url, None, params).await
    }

    pub async fn options(
        &self,
        url: &str,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::OPTIONS, url, None, params).await
    }

    pub async fn post(
        &self,
        url: &str,
        body: Option<Bytes>,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::POST, url, body, params).await
    }

    pub async fn put(
        &self,
        url: &str,
        body: Option<Bytes>,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::PUT, url, body, params).await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: Option<Bytes>,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        self.request(Method::PATCH, url, body, params).await
    }

    /// Performs one instrumented request.
    ///
    /// The returned response or error is exactly what the wrapped
    /// transport produced; instrumentation only changes the headers sent
    /// on the wire and emits a span record out of band.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        params: Option<RequestParams>,
    ) -> Result<HttpResponse, TransportError> {
        let config = self.shared.config();
        let mut headers = params.unwrap_or_default().headers;

        let ctx = match config.propagator().extract(&headers) {
            Some(remote) => TraceContext::child_of(&remote),
            None => {
                let fields = config.propagator().fields();
                if fields.iter().any(|field| headers.contains_key(field)) {
                    debug!(
                        propagator = config.propagator().name(),
                        "malformed incoming trace context, starting a fresh root trace"
                    );
                }
                TraceContext::root(self.shared.run_mode())
            }
        };

        let sampled = decide(ctx.trace_id(), config.sampling());
        let ctx = ctx.with_sampled(sampled);

        config.baggage().apply(&mut headers);
        config.propagator().inject(&ctx, &mut headers);

        let span = self.shared.recorder().start(&ctx, &method, url);
        let result = self.transport.request(method, url, body, headers).await;

        match &result {
            Ok(response) => span.finish(SpanOutcome::Completed {
                status: response.status.as_u16(),
            }),
            Err(error) => span.finish(SpanOutcome::TransportError {
                message: error.to_string(),
            }),
        }

        result
    }
}
