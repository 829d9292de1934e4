// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of the instrumentation seams for testing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use tempest_http_instrument::{
    HttpResponse, HttpTransport, SpanRecord, SpanSink, TransportError,
};

/// One request as seen by the mock transport.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Bytes>,
    pub headers: HeaderMap,
}

/// Transport that records every request and answers with a canned
/// response. Clones share the captured-request log.
#[derive(Clone)]
pub struct MockTransport {
    status: StatusCode,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn with_status(status: StatusCode) -> Self {
        MockTransport {
            status,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .expect("no request captured")
            .clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(CapturedRequest {
            method,
            url: url.to_string(),
            body,
            headers,
        });

        let mut response_headers = HeaderMap::new();
        response_headers.insert("x-served-by", "mock".parse().unwrap());

        Ok(HttpResponse {
            status: self.status,
            headers: response_headers,
            body: Bytes::from_static(b"mock body"),
            duration: Duration::from_millis(5),
        })
    }
}

/// Transport that always fails with a connect error.
pub struct FailingTransport;

impl FailingTransport {
    pub fn expected_error(url: &str) -> TransportError {
        TransportError::Connect {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn request(
        &self,
        _method: Method,
        url: &str,
        _body: Option<Bytes>,
        _headers: HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        Err(Self::expected_error(url))
    }
}

/// Transport that never completes, for cancellation tests.
pub struct HangingTransport;

#[async_trait]
impl HttpTransport for HangingTransport {
    async fn request(
        &self,
        _method: Method,
        _url: &str,
        _body: Option<Bytes>,
        _headers: HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        std::future::pending::<()>().await;
        unreachable!("pending future completed")
    }
}

/// Sink collecting every finalized span record.
#[derive(Default)]
pub struct CapturingSink {
    records: Mutex<Vec<SpanRecord>>,
}

impl CapturingSink {
    pub fn records(&self) -> Vec<SpanRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Waits until at least `count` spans were delivered; emission is a
    /// bounded handoff through a background forwarder, so delivery is
    /// asynchronous to the call itself.
    pub async fn wait_for(&self, count: usize) -> Vec<SpanRecord> {
        for _ in 0..200 {
            let records = self.records();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "expected at least {count} span records, got {}",
            self.records().len()
        );
    }
}

impl SpanSink for CapturingSink {
    fn accept(&self, span: SpanRecord) {
        self.records.lock().unwrap().push(span);
    }
}
