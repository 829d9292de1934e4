// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! Deterministic sampling policy.
//!
//! The decision is a pure function of the trace id and the configured
//! rate, so every span of one trace carries the same sampled flag no
//! matter which virtual user or hop computes it, without any shared state.

use std::hash::Hasher;

use fnv::FnvHasher;

use crate::context::TraceId;

/// Sampling rate as an integer percentage of traces to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRate(u8);

/// Error raised at configuration time for rates outside `[0, 100]`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("sampling rate must be an integer percentage within [0, 100], got {0}")]
pub struct InvalidSampleRate(pub i64);

impl SampleRate {
    /// Record every trace.
    pub const ALWAYS: SampleRate = SampleRate(100);

    /// Record no traces.
    pub const NEVER: SampleRate = SampleRate(0);

    pub fn new(percent: i64) -> Result<Self, InvalidSampleRate> {
        if !(0..=100).contains(&percent) {
            return Err(InvalidSampleRate(percent));
        }
        Ok(SampleRate(percent as u8))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SampleRate {
    type Error = InvalidSampleRate;

    fn try_from(percent: i64) -> Result<Self, Self::Error> {
        SampleRate::new(percent)
    }
}

/// Decides whether the trace identified by `trace_id` is recorded.
///
/// The trace id bytes are FNV-1a hashed onto `[0, 100)` and compared
/// against the rate. Rate 0 never samples and rate 100 always does.
pub fn decide(trace_id: &TraceId, rate: SampleRate) -> bool {
    match rate.percent() {
        0 => false,
        100 => true,
        percent => {
            let mut hasher = FnvHasher::default();
            hasher.write(trace_id.as_bytes());
            hasher.finish() % 100 < u64::from(percent)
        }
    }
}
