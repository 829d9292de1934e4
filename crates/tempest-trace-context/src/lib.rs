// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! Trace-context primitives for the HTTP instrumentation layer: trace and
//! span identifiers, wire-format propagation, and the deterministic
//! sampling policy. Everything in this crate is synchronous and pure so it
//! can be called from any concurrency unit without coordination.

pub mod context;
pub mod propagation;
pub mod sampling;

pub use context::{RunMode, SpanId, TraceContext, TraceId};
pub use propagation::{Propagator, PropagatorRegistry};
pub use sampling::{decide, InvalidSampleRate, SampleRate};
