// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Varint-encoded marker at the start of every locally generated trace id.
const TRACE_ID_PREFIX: i16 = 0o124; // 0o124 is the ASCII code for 'T'

/// Run-mode code embedded in locally generated trace ids, so the backend
/// can tell which runs to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Spans of this run are ingested and processed by the cloud backend.
    Cloud,
    /// Local run; related spans are not ingested.
    Local,
}

impl RunMode {
    fn code(self) -> i8 {
        match self {
            RunMode::Cloud => 12,
            RunMode::Local => 33,
        }
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            12 => Some(RunMode::Cloud),
            33 => Some(RunMode::Local),
            _ => None,
        }
    }
}

/// Error returned when an identifier cannot be parsed from its wire form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("identifier has wrong length: expected {expected} hex characters, got {got}")]
    Length { expected: usize, got: usize },

    #[error("identifier contains non-hex characters")]
    NonHex,

    #[error("all-zero identifier is not valid")]
    Zero,
}

/// A 128-bit trace identifier, rendered as 32 lowercase hex characters on
/// the wire.
///
/// Locally generated ids embed a recognizable layout: the varint-encoded
/// [`TRACE_ID_PREFIX`], the varint-encoded [`RunMode`] code, and the
/// uvarint unix timestamp in milliseconds, padded to 16 bytes with random
/// data. Ids extracted from incoming headers are opaque 16-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// Generates a fresh trace id carrying the given run-mode code and the
    /// current unix-millisecond timestamp.
    pub fn generate(mode: RunMode) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::generate_at(mode, millis)
    }

    fn generate_at(mode: RunMode, unix_millis: u64) -> Self {
        let mut encoded = Vec::with_capacity(16);
        put_varint(&mut encoded, i64::from(TRACE_ID_PREFIX));
        put_varint(&mut encoded, i64::from(mode.code()));
        put_uvarint(&mut encoded, unix_millis);

        let mut bytes = [0u8; 16];
        bytes[..encoded.len()].copy_from_slice(&encoded);
        rand::thread_rng().fill(&mut bytes[encoded.len()..]);
        TraceId(bytes)
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Result<Self, IdParseError> {
        if bytes == [0u8; 16] {
            return Err(IdParseError::Zero);
        }
        Ok(TraceId(bytes))
    }

    pub fn from_hex(hex: &str) -> Result<Self, IdParseError> {
        let mut bytes = [0u8; 16];
        decode_hex(hex, &mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Whether this id carries the local generation scheme: the expected
    /// prefix followed by a known run-mode code.
    pub fn is_runtime_generated(&self) -> bool {
        self.run_mode().is_some()
    }

    /// Decodes the run-mode code, if this id was generated by [`Self::generate`].
    pub fn run_mode(&self) -> Option<RunMode> {
        let (prefix, read) = read_varint(&self.0)?;
        if prefix != i64::from(TRACE_ID_PREFIX) {
            return None;
        }
        let (code, _) = read_varint(&self.0[read..])?;
        RunMode::from_code(code)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A 64-bit span identifier, rendered as 16 lowercase hex characters,
/// freshly generated for every instrumented call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let bytes: [u8; 8] = rng.gen();
            if bytes != [0u8; 8] {
                return SpanId(bytes);
            }
        }
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Result<Self, IdParseError> {
        if bytes == [0u8; 8] {
            return Err(IdParseError::Zero);
        }
        Ok(SpanId(bytes))
    }

    pub fn from_hex(hex: &str) -> Result<Self, IdParseError> {
        let mut bytes = [0u8; 8];
        decode_hex(hex, &mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Trace context of one instrumented call.
///
/// The trace id is fixed for the whole call chain; the span id is unique to
/// this call. Contexts are created at call start and discarded when the
/// call completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    sampled: bool,
}

impl TraceContext {
    /// A fresh root context with no parent. The sampled flag starts unset
    /// and is decided by the sampling policy before injection.
    pub fn root(mode: RunMode) -> Self {
        TraceContext {
            trace_id: TraceId::generate(mode),
            span_id: SpanId::generate(),
            parent_span_id: None,
            sampled: false,
        }
    }

    /// A context as decoded from incoming headers: the remote span id is
    /// carried as-is and becomes the parent when [`Self::child_of`] derives
    /// the context for the next hop.
    pub fn remote(trace_id: TraceId, span_id: SpanId, sampled: bool) -> Self {
        TraceContext {
            trace_id,
            span_id,
            parent_span_id: None,
            sampled,
        }
    }

    /// Derives the context for a new call within an existing trace: same
    /// trace id, fresh span id, and the given context's span id as parent.
    pub fn child_of(remote: &TraceContext) -> Self {
        TraceContext {
            trace_id: remote.trace_id,
            span_id: SpanId::generate(),
            parent_span_id: Some(remote.span_id),
            sampled: remote.sampled,
        }
    }

    pub fn with_sampled(mut self, sampled: bool) -> Self {
        self.sampled = sampled;
        self
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    pub fn span_id(&self) -> &SpanId {
        &self.span_id
    }

    pub fn parent_span_id(&self) -> Option<&SpanId> {
        self.parent_span_id.as_ref()
    }

    pub fn sampled(&self) -> bool {
        self.sampled
    }
}

fn decode_hex(hex: &str, out: &mut [u8]) -> Result<(), IdParseError> {
    if hex.len() != out.len() * 2 {
        return Err(IdParseError::Length {
            expected: out.len() * 2,
            got: hex.len(),
        });
    }
    for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
        let high = hex_digit(chunk[0]).ok_or(IdParseError::NonHex)?;
        let low = hex_digit(chunk[1]).ok_or(IdParseError::NonHex)?;
        out[i] = (high << 4) | low;
    }
    Ok(())
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

// LEB128 variable-length integers, zigzag-encoded for the signed variants.
// Layout compatibility with the id scheme is covered by the tests below.

fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn put_varint(buf: &mut Vec<u8>, value: i64) {
    let mut zigzag = (value as u64) << 1;
    if value < 0 {
        zigzag = !zigzag;
    }
    put_uvarint(buf, zigzag);
}

fn read_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if i == 10 {
            return None;
        }
        if byte < 0x80 {
            if i == 9 && byte > 1 {
                return None;
            }
            return Some((value | (u64::from(byte) << shift), i + 1));
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    None
}

fn read_varint(buf: &[u8]) -> Option<(i64, usize)> {
    let (zigzag, read) = read_uvarint(buf)?;
    let mut value = (zigzag >> 1) as i64;
    if zigzag & 1 != 0 {
        value = !value;
    }
    Some((value, read))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_hex_round_trip() {
        let id = TraceId::generate(RunMode::Local);
        let hex = id.to_string();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(TraceId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_span_id_hex_round_trip() {
        let id = SpanId::generate();
        let hex = id.to_string();
        assert_eq!(hex.len(), 16);
        assert_eq!(SpanId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TraceId::generate(RunMode::Local);
        let b = TraceId::generate(RunMode::Local);
        assert_ne!(a, b);
        assert_ne!(SpanId::generate(), SpanId::generate());
    }

    #[test]
    fn test_trace_id_embeds_run_mode() {
        let cloud = TraceId::generate(RunMode::Cloud);
        assert!(cloud.is_runtime_generated());
        assert_eq!(cloud.run_mode(), Some(RunMode::Cloud));

        let local = TraceId::generate(RunMode::Local);
        assert_eq!(local.run_mode(), Some(RunMode::Local));
    }

    #[test]
    fn test_foreign_trace_id_is_not_runtime_generated() {
        let foreign = TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap();
        assert!(!foreign.is_runtime_generated());
        assert_eq!(foreign.run_mode(), None);
    }

    #[test]
    fn test_trace_id_rejects_bad_hex() {
        assert_eq!(
            TraceId::from_hex("0af765"),
            Err(IdParseError::Length {
                expected: 32,
                got: 6
            })
        );
        assert_eq!(
            TraceId::from_hex("gggggggggggggggggggggggggggggggg"),
            Err(IdParseError::NonHex)
        );
        assert_eq!(
            TraceId::from_hex("00000000000000000000000000000000"),
            Err(IdParseError::Zero)
        );
    }

    #[test]
    fn test_span_id_rejects_zero() {
        assert_eq!(
            SpanId::from_hex("0000000000000000"),
            Err(IdParseError::Zero)
        );
    }

    #[test]
    fn test_trace_id_accepts_uppercase_hex() {
        let id = TraceId::from_hex("0AF7651916CD43DD8448EB211C80319C").unwrap();
        assert_eq!(id.to_string(), "0af7651916cd43dd8448eb211c80319c");
    }

    #[test]
    fn test_timestamp_survives_encoding() {
        let millis = 1_720_000_000_000u64;
        let id = TraceId::generate_at(RunMode::Cloud, millis);

        let (_, prefix_len) = read_varint(id.as_bytes()).unwrap();
        let (_, code_len) = read_varint(&id.as_bytes()[prefix_len..]).unwrap();
        let (decoded, _) = read_uvarint(&id.as_bytes()[prefix_len + code_len..]).unwrap();
        assert_eq!(decoded, millis);
    }

    #[test]
    fn test_varint_round_trip() {
        for value in [0i64, 1, -1, 84, -84, i64::from(i16::MAX), i64::MIN] {
            let mut buf = Vec::new();
            put_varint(&mut buf, value);
            assert_eq!(read_varint(&buf), Some((value, buf.len())));
        }
    }

    #[test]
    fn test_uvarint_round_trip() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, u64::MAX] {
            let mut buf = Vec::new();
            put_uvarint(&mut buf, value);
            assert_eq!(read_uvarint(&buf), Some((value, buf.len())));
        }
    }

    #[test]
    fn test_root_context_has_no_parent() {
        let ctx = TraceContext::root(RunMode::Local);
        assert!(ctx.parent_span_id().is_none());
        assert!(!ctx.sampled());
    }

    #[test]
    fn test_child_context_links_to_remote_span() {
        let remote = TraceContext::remote(
            TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
            SpanId::from_hex("b7ad6b7169203331").unwrap(),
            true,
        );

        let child = TraceContext::child_of(&remote);
        assert_eq!(child.trace_id(), remote.trace_id());
        assert_ne!(child.span_id(), remote.span_id());
        assert_eq!(child.parent_span_id(), Some(remote.span_id()));
        assert!(child.sampled());
    }
}
