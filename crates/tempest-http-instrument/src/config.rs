// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use tempest_trace_context::propagation::W3cPropagator;
use tempest_trace_context::{Propagator, PropagatorRegistry, SampleRate};

use crate::baggage::Baggage;
use crate::error::ConfigError;

/// Format selected when the options leave `propagator` unset.
pub const DEFAULT_PROPAGATOR: &str = "w3c";

/// Raw, script-supplied instrumentation options.
///
/// Unknown keys are rejected so a typo fails loudly at install time
/// instead of silently falling back to a default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstrumentationOptions {
    /// Integer percentage of traces to record, `[0, 100]`. Defaults to 100.
    pub sampling: Option<i64>,

    /// Name of a registered propagation format. Defaults to
    /// [`DEFAULT_PROPAGATOR`].
    pub propagator: Option<String>,

    /// Baggage headers added to every outgoing request. Defaults to empty.
    pub baggage: HashMap<String, String>,
}

impl InstrumentationOptions {
    /// Deserializes options handed over by the script engine as JSON.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Validated, immutable configuration snapshot.
///
/// Built once per (re)configuration and read lock-free by every call; a
/// call observes either the previous snapshot or the new one, never a mix.
#[derive(Clone)]
pub struct InstrumentationConfig {
    sampling: SampleRate,
    propagator: Arc<dyn Propagator>,
    baggage: Baggage,
}

impl InstrumentationConfig {
    /// Validates raw options against the registry.
    pub fn from_options(
        options: &InstrumentationOptions,
        registry: &PropagatorRegistry,
    ) -> Result<Self, ConfigError> {
        let sampling = SampleRate::new(options.sampling.unwrap_or(100))?;

        let name = options.propagator.as_deref().unwrap_or(DEFAULT_PROPAGATOR);
        let propagator = registry
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPropagator {
                name: name.to_string(),
                registered: registry.names(),
            })?;

        let baggage = Baggage::parse(&options.baggage, propagator.fields())?;

        Ok(InstrumentationConfig {
            sampling,
            propagator,
            baggage,
        })
    }

    pub fn sampling(&self) -> SampleRate {
        self.sampling
    }

    pub fn propagator(&self) -> &dyn Propagator {
        self.propagator.as_ref()
    }

    pub fn baggage(&self) -> &Baggage {
        &self.baggage
    }
}

impl Default for InstrumentationConfig {
    /// The documented fallback when no configuration was installed:
    /// 100% sampling, the W3C propagator, no baggage.
    fn default() -> Self {
        InstrumentationConfig {
            sampling: SampleRate::ALWAYS,
            propagator: Arc::new(W3cPropagator),
            baggage: Baggage::empty(),
        }
    }
}

impl fmt::Debug for InstrumentationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentationConfig")
            .field("sampling", &self.sampling.percent())
            .field("propagator", &self.propagator.name())
            .field("baggage_entries", &self.baggage.len())
            .finish()
    }
}
