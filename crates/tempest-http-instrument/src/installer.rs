// Copyright 2025-Present Tempest Labs, Inc. https://www.tempestlabs.io/
// SPDX-License-Identifier: Apache-2.0

//! One-time installation of the instrumentation layer.
//!
//! [`Instrumentation`] owns the process-wide configuration snapshot, the
//! propagator registry and the span recorder. Configuration is validated
//! up front and swapped in atomically; call paths read the snapshot
//! lock-free and are never exposed to a partially-applied configuration.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use tempest_trace_context::{PropagatorRegistry, RunMode};

use crate::client::InstrumentedClient;
use crate::config::{InstrumentationConfig, InstrumentationOptions};
use crate::error::ConfigError;
use crate::recorder::{SpanRecorder, SpanSink};
use crate::transport::HttpTransport;

/// Shared instrumentation state bound to one span sink. Cheap to clone;
/// clones share the configuration and the recorder.
///
/// Expected lifecycle: build once before virtual users start issuing
/// traffic, [`configure`](Self::configure) it from the script's options,
/// and create one [`InstrumentedClient`] per wrapped transport. Without an
/// explicit `configure`, clients run with the documented defaults (100%
/// sampling, the `w3c` propagator, no baggage).
#[derive(Clone)]
pub struct Instrumentation {
    inner: Arc<Inner>,
}

struct Inner {
    config: ArcSwap<InstrumentationConfig>,
    registry: PropagatorRegistry,
    recorder: SpanRecorder,
    run_mode: RunMode,
}

impl Instrumentation {
    /// Builds the shared state with the built-in propagator formats and
    /// local run mode. Must be called from within a tokio runtime (the
    /// span forwarder task is spawned here).
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self::with_registry(sink, PropagatorRegistry::default(), RunMode::Local)
    }

    /// Same as [`Self::new`] with a caller-assembled registry (e.g. with
    /// additional propagation formats) and an explicit run mode.
    pub fn with_registry(
        sink: Arc<dyn SpanSink>,
        registry: PropagatorRegistry,
        run_mode: RunMode,
    ) -> Self {
        Instrumentation {
            inner: Arc::new(Inner {
                config: ArcSwap::from_pointee(InstrumentationConfig::default()),
                registry,
                recorder: SpanRecorder::new(sink),
                run_mode,
            }),
        }
    }

    /// Validates `options` and atomically replaces the active
    /// configuration.
    ///
    /// May be called again to reconfigure between tests: the last
    /// successful call wins, existing clients pick up the new snapshot on
    /// their next request, and in-flight requests keep the snapshot they
    /// started with. A failed call leaves the previous configuration
    /// untouched.
    pub fn configure(&self, options: &InstrumentationOptions) -> Result<(), ConfigError> {
        let config = InstrumentationConfig::from_options(options, &self.inner.registry)?;
        info!(
            sampling = config.sampling().percent(),
            propagator = config.propagator().name(),
            baggage_entries = config.baggage().len(),
            "http instrumentation configured"
        );
        self.inner.config.store(Arc::new(config));
        Ok(())
    }

    /// Validates and installs `options`, then binds `transport` — the
    /// one-call installation path.
    pub fn instrument<T: HttpTransport>(
        &self,
        transport: T,
        options: &InstrumentationOptions,
    ) -> Result<InstrumentedClient<T>, ConfigError> {
        self.configure(options)?;
        Ok(self.client(transport))
    }

    /// Binds `transport` to the currently active configuration without
    /// requiring a prior [`configure`](Self::configure) call.
    pub fn client<T: HttpTransport>(&self, transport: T) -> InstrumentedClient<T> {
        InstrumentedClient::new(transport, self.clone())
    }

    pub(crate) fn config(&self) -> Arc<InstrumentationConfig> {
        self.inner.config.load_full()
    }

    pub(crate) fn recorder(&self) -> &SpanRecorder {
        &self.inner.recorder
    }

    pub(crate) fn run_mode(&self) -> RunMode {
        self.inner.run_mode
    }
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.inner.config.load();
        f.debug_struct("Instrumentation")
            .field("config", &**config)
            .field("registry", &self.inner.registry)
            .field("run_mode", &self.inner.run_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::SpanRecord;

    fn noop_sink() -> Arc<dyn SpanSink> {
        Arc::new(|_span: SpanRecord| {})
    }

    #[tokio::test]
    async fn test_unconfigured_instrumentation_uses_defaults() {
        let instrumentation = Instrumentation::new(noop_sink());
        let config = instrumentation.config();

        assert_eq!(config.sampling().percent(), 100);
        assert_eq!(config.propagator().name(), "w3c");
        assert!(config.baggage().is_empty());
    }

    #[tokio::test]
    async fn test_configure_swaps_snapshot() {
        let instrumentation = Instrumentation::new(noop_sink());
        let before = instrumentation.config();

        instrumentation
            .configure(&InstrumentationOptions {
                sampling: Some(25),
                propagator: Some("b3".to_string()),
                ..Default::default()
            })
            .unwrap();

        let after = instrumentation.config();
        assert_eq!(after.sampling().percent(), 25);
        assert_eq!(after.propagator().name(), "b3");

        // The previously loaded snapshot is unaffected.
        assert_eq!(before.sampling().percent(), 100);
    }

    #[tokio::test]
    async fn test_reconfigure_last_call_wins() {
        let instrumentation = Instrumentation::new(noop_sink());

        instrumentation
            .configure(&InstrumentationOptions {
                sampling: Some(10),
                ..Default::default()
            })
            .unwrap();
        instrumentation
            .configure(&InstrumentationOptions {
                sampling: Some(90),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(instrumentation.config().sampling().percent(), 90);
    }

    #[tokio::test]
    async fn test_failed_configure_keeps_previous_snapshot() {
        let instrumentation = Instrumentation::new(noop_sink());
        instrumentation
            .configure(&InstrumentationOptions {
                sampling: Some(42),
                ..Default::default()
            })
            .unwrap();

        let err = instrumentation
            .configure(&InstrumentationOptions {
                propagator: Some("zipkin".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPropagator { .. }));

        assert_eq!(instrumentation.config().sampling().percent(), 42);
    }

    #[tokio::test]
    async fn test_clones_share_configuration() {
        let instrumentation = Instrumentation::new(noop_sink());
        let clone = instrumentation.clone();

        instrumentation
            .configure(&InstrumentationOptions {
                sampling: Some(5),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(clone.config().sampling().percent(), 5);
    }
}
