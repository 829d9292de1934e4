// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! HTTP-call instrumentation for the load-generation runtime.
//!
//! Wraps an existing HTTP transport so that every outgoing request carries
//! distributed-tracing headers, a deterministic sampling decision and
//! configured baggage, and emits one finalized span record per call. The
//! wrapped transport's observable behavior — return values, parameter
//! shapes, failures — is preserved exactly.
//!
//! Entry point is [`Instrumentation`]: build it once with a span sink,
//! optionally [`Instrumentation::configure`] it from script-supplied
//! options, and hand [`InstrumentedClient`]s to the scripts in place of
//! the raw client.

pub mod baggage;
pub mod client;
pub mod config;
pub mod error;
pub mod installer;
pub mod recorder;
pub mod transport;

pub use baggage::Baggage;
pub use client::{InstrumentedClient, RequestParams};
pub use config::{InstrumentationConfig, InstrumentationOptions};
pub use error::ConfigError;
pub use installer::Instrumentation;
pub use recorder::{SpanOutcome, SpanRecord, SpanRecorder, SpanSink};
pub use transport::{HttpResponse, HttpTransport, TransportError};
