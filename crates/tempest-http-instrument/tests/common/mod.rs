// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures for the integration suite.

pub mod mocks;

use std::collections::HashMap;

use tempest_http_instrument::InstrumentationOptions;

/// Options with the given sampling percentage and no other settings.
pub fn sampling_options(percent: i64) -> InstrumentationOptions {
    InstrumentationOptions {
        sampling: Some(percent),
        ..Default::default()
    }
}

/// Options carrying only the given baggage entries.
pub fn baggage_options(entries: &[(&str, &str)]) -> InstrumentationOptions {
    InstrumentationOptions {
        baggage: entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
        ..Default::default()
    }
}
