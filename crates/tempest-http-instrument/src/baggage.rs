// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! User-defined baggage headers.
//!
//! Baggage is validated once at install time and merged into outgoing
//! headers on every call. Caller-supplied headers always win on a name
//! collision; baggage only fills in names that are absent.

use std::collections::HashMap;

use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ConfigError;

/// Longest accepted baggage value, in bytes.
const MAX_VALUE_LEN: usize = 4096;

/// A validated set of baggage header name/value pairs.
#[derive(Debug, Clone, Default)]
pub struct Baggage {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Baggage {
    pub fn empty() -> Self {
        Baggage::default()
    }

    /// Validates the configured entries against the header charset and the
    /// reserved trace-context header names of the selected propagator.
    ///
    /// Invalid entries are rejected here, at install time — they are never
    /// silently dropped on the call path.
    pub fn parse(
        entries: &HashMap<String, String>,
        reserved: &[HeaderName],
    ) -> Result<Self, ConfigError> {
        let mut validated = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ConfigError::InvalidBaggageName(key.clone()))?;

            if reserved.contains(&name) {
                return Err(ConfigError::ReservedBaggageName(key.clone()));
            }

            if value.len() > MAX_VALUE_LEN {
                return Err(ConfigError::BaggageValueTooLong {
                    name: key.clone(),
                    limit: MAX_VALUE_LEN,
                });
            }
            if value.chars().any(|c| c.is_control()) {
                return Err(ConfigError::InvalidBaggageValue(key.clone()));
            }
            let value = HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidBaggageValue(key.clone()))?;

            validated.push((name, value));
        }

        // Stable order keeps the outgoing header layout reproducible.
        validated.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        Ok(Baggage { entries: validated })
    }

    /// Merges the baggage into `headers`, inserting only names that the
    /// caller did not already set.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
