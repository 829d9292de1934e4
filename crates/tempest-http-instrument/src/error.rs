// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

use tempest_trace_context::InvalidSampleRate;

/// Errors raised while installing the instrumentation configuration.
///
/// All of these surface at install time and prevent an instrumented client
/// from being produced; none of them is deferred to per-call time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid sampling rate: {0}")]
    InvalidSamplingRate(#[from] InvalidSampleRate),

    #[error("unknown propagator {name:?}; registered formats: {registered:?}")]
    UnknownPropagator {
        name: String,
        registered: Vec<&'static str>,
    },

    #[error("invalid baggage header name {0:?}")]
    InvalidBaggageName(String),

    #[error("invalid baggage value for header {0:?}: control characters are not allowed")]
    InvalidBaggageValue(String),

    #[error("baggage value for header {name:?} exceeds {limit} bytes")]
    BaggageValueTooLong { name: String, limit: usize },

    #[error("baggage header {0:?} collides with a trace context header")]
    ReservedBaggageName(String),

    #[error("malformed instrumentation options: {0}")]
    MalformedOptions(#[from] serde_json::Error),
}
