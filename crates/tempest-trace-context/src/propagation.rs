// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! Wire-format propagation of trace context.
//!
//! A [`Propagator`] owns one header format: it injects a [`TraceContext`]
//! into outgoing headers and extracts one from incoming headers. Extraction
//! is best-effort by contract — malformed or absent headers yield `None`
//! and the caller starts a fresh root trace.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::context::{SpanId, TraceContext, TraceId};

/// W3C trace context header.
pub static TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");

/// B3 single-header format.
pub static B3: HeaderName = HeaderName::from_static("b3");

/// Jaeger trace context header.
pub static UBER_TRACE_ID: HeaderName = HeaderName::from_static("uber-trace-id");

/// Encode/decode logic for one trace-context wire format.
pub trait Propagator: Send + Sync + fmt::Debug {
    /// Registry name of this format.
    fn name(&self) -> &'static str;

    /// The header names this format owns. Configured baggage must not
    /// collide with these.
    fn fields(&self) -> &[HeaderName];

    /// Writes the context into `headers`, replacing any existing values of
    /// the owned header names.
    fn inject(&self, ctx: &TraceContext, headers: &mut HeaderMap);

    /// Reads a context out of `headers`. Returns `None` when the owned
    /// headers are absent or malformed.
    fn extract(&self, headers: &HeaderMap) -> Option<TraceContext>;
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn insert_ascii(headers: &mut HeaderMap, name: &HeaderName, value: String) {
    // Values are built from hex digits and separators, so this never fails.
    if let Ok(value) = HeaderValue::try_from(value) {
        headers.insert(name.clone(), value);
    }
}

/// W3C Trace Context, `traceparent: 00-{trace-id}-{span-id}-{flags}`.
///
/// Only version `00` is produced and accepted. All-zero trace or span ids
/// are rejected on extraction, per the specification.
#[derive(Debug, Default)]
pub struct W3cPropagator;

impl Propagator for W3cPropagator {
    fn name(&self) -> &'static str {
        "w3c"
    }

    fn fields(&self) -> &[HeaderName] {
        std::slice::from_ref(&TRACEPARENT)
    }

    fn inject(&self, ctx: &TraceContext, headers: &mut HeaderMap) {
        let flags: u8 = if ctx.sampled() { 0x01 } else { 0x00 };
        let value = format!("00-{}-{}-{flags:02x}", ctx.trace_id(), ctx.span_id());
        insert_ascii(headers, &TRACEPARENT, value);
    }

    fn extract(&self, headers: &HeaderMap) -> Option<TraceContext> {
        let value = header_str(headers, &TRACEPARENT)?;
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() != 4 || parts[0] != "00" {
            return None;
        }

        let trace_id = TraceId::from_hex(parts[1]).ok()?;
        let span_id = SpanId::from_hex(parts[2]).ok()?;
        if parts[3].len() != 2 {
            return None;
        }
        let flags = u8::from_str_radix(parts[3], 16).ok()?;

        Some(TraceContext::remote(trace_id, span_id, flags & 0x01 != 0))
    }
}

/// B3 single-header format, `b3: {trace-id}-{span-id}[-{0|1}]`.
#[derive(Debug, Default)]
pub struct B3Propagator;

impl Propagator for B3Propagator {
    fn name(&self) -> &'static str {
        "b3"
    }

    fn fields(&self) -> &[HeaderName] {
        std::slice::from_ref(&B3)
    }

    fn inject(&self, ctx: &TraceContext, headers: &mut HeaderMap) {
        let sampled: u8 = if ctx.sampled() { 1 } else { 0 };
        let value = format!("{}-{}-{sampled}", ctx.trace_id(), ctx.span_id());
        insert_ascii(headers, &B3, value);
    }

    fn extract(&self, headers: &HeaderMap) -> Option<TraceContext> {
        let value = header_str(headers, &B3)?;
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }

        let trace_id = TraceId::from_hex(parts[0]).ok()?;
        let span_id = SpanId::from_hex(parts[1]).ok()?;
        let sampled = match parts.get(2) {
            Some(&"1") | Some(&"d") => true,
            Some(&"0") | None => false,
            Some(_) => return None,
        };

        Some(TraceContext::remote(trace_id, span_id, sampled))
    }
}

/// Jaeger format, `uber-trace-id: {trace-id}:{span-id}:{parent}:{flags}`.
///
/// The parent field is accepted but ignored on extraction: the extracted
/// span id becomes the parent of the next hop regardless.
#[derive(Debug, Default)]
pub struct JaegerPropagator;

impl Propagator for JaegerPropagator {
    fn name(&self) -> &'static str {
        "jaeger"
    }

    fn fields(&self) -> &[HeaderName] {
        std::slice::from_ref(&UBER_TRACE_ID)
    }

    fn inject(&self, ctx: &TraceContext, headers: &mut HeaderMap) {
        let flags: u8 = if ctx.sampled() { 1 } else { 0 };
        let parent = match ctx.parent_span_id() {
            Some(parent) => parent.to_string(),
            None => "0".to_string(),
        };
        let value = format!("{}:{}:{parent}:{flags:x}", ctx.trace_id(), ctx.span_id());
        insert_ascii(headers, &UBER_TRACE_ID, value);
    }

    fn extract(&self, headers: &HeaderMap) -> Option<TraceContext> {
        let value = header_str(headers, &UBER_TRACE_ID)?;
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 4 {
            return None;
        }

        let trace_id = TraceId::from_hex(parts[0]).ok()?;
        let span_id = SpanId::from_hex(parts[1]).ok()?;
        let flags = u8::from_str_radix(parts[3], 16).ok()?;

        Some(TraceContext::remote(trace_id, span_id, flags & 0x01 != 0))
    }
}

/// Registry of propagation formats, keyed by name.
///
/// Selecting a name that was never registered is a configuration error for
/// the installer; the registry itself just reports the miss.
pub struct PropagatorRegistry {
    entries: HashMap<&'static str, Arc<dyn Propagator>>,
}

impl PropagatorRegistry {
    /// An empty registry with no formats.
    pub fn empty() -> Self {
        PropagatorRegistry {
            entries: HashMap::new(),
        }
    }

    /// Registers a propagator under its own name, replacing any previous
    /// entry with that name.
    pub fn register(&mut self, propagator: Arc<dyn Propagator>) {
        self.entries.insert(propagator.name(), propagator);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Propagator>> {
        self.entries.get(name).cloned()
    }

    /// Registered format names, sorted for stable error messages.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for PropagatorRegistry {
    /// Registry with the built-in `w3c`, `b3` and `jaeger` formats.
    fn default() -> Self {
        let mut registry = PropagatorRegistry::empty();
        registry.register(Arc::new(W3cPropagator));
        registry.register(Arc::new(B3Propagator));
        registry.register(Arc::new(JaegerPropagator));
        registry
    }
}

impl fmt::Debug for PropagatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
