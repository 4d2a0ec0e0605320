// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Entry point that ties the registry, clock and configuration together.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::histogram::HistogramMetric;
use super::labels::LabelSet;
use super::registry::MetricsRegistry;
use super::transaction::TransactionContext;
use crate::config::InstrumentationConfig;
use crate::error::MetricsError;

/// Base name of the real-duration histogram.
pub const REAL_DURATION_METRIC: &str = "method_call_real_duration_seconds";

/// Base name of the CPU-duration histogram.
pub const CPU_DURATION_METRIC: &str = "method_call_cpu_duration_seconds";

/// State shared by every transaction created from one [`Instrumentation`].
pub(crate) struct Shared {
    pub(crate) registry: Arc<MetricsRegistry>,
    pub(crate) real_duration: Arc<HistogramMetric>,
    pub(crate) cpu_duration: Arc<HistogramMetric>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) threshold: Duration,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("real_duration", &self.real_duration.name())
            .field("cpu_duration", &self.cpu_duration.name())
            .field("clock", &self.clock)
            .field("threshold", &self.threshold)
            .finish()
    }
}

/// Creates transaction contexts for a runtime.
///
/// Built once at process start and cloned cheaply into whatever hands out
/// units of work.
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use callmeter::config::InstrumentationConfig;
/// use callmeter::metrics::{Instrumentation, LabelSet, MetricsRegistry};
///
/// let registry = Arc::new(MetricsRegistry::new());
/// let instrumentation = Instrumentation::new(registry, &InstrumentationConfig::default())?;
///
/// let mut tx = instrumentation.transaction(LabelSet::from([("controller", "Commits"), ("action", "show")]));
/// let diff = tx.with_instrumentation("Commit", "diffs", || load_diffs());
/// let report = tx.finalize();
/// ```
#[derive(Debug, Clone)]
pub struct Instrumentation {
    shared: Arc<Shared>,
}

impl Instrumentation {
    /// Create an instrumentation handle using the system clock.
    pub fn new(
        registry: Arc<MetricsRegistry>,
        config: &InstrumentationConfig,
    ) -> Result<Self, MetricsError> {
        Self::with_clock(registry, config, Arc::new(SystemClock::new()))
    }

    /// Create an instrumentation handle with a specific clock.
    ///
    /// Registers the two method-call histograms; fails if either name is
    /// already registered with a different bucket layout.
    pub fn with_clock(
        registry: Arc<MetricsRegistry>,
        config: &InstrumentationConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MetricsError> {
        let threshold = Duration::try_from_secs_f64(config.method_call_threshold)
            .map_err(|_| MetricsError::InvalidThreshold(config.method_call_threshold))?;

        let buckets = &config.histogram_buckets;
        let real_duration = registry.get_or_create(
            &config.metric_name(REAL_DURATION_METRIC),
            "Method calls real duration",
            buckets,
        )?;
        let cpu_duration = registry.get_or_create(
            &config.metric_name(CPU_DURATION_METRIC),
            "Method calls cpu duration",
            buckets,
        )?;

        Ok(Self {
            shared: Arc::new(Shared {
                registry,
                real_duration,
                cpu_duration,
                clock,
                threshold,
            }),
        })
    }

    /// Start a unit of work with the given ambient labels.
    pub fn transaction(&self, labels: LabelSet) -> TransactionContext {
        TransactionContext::new(labels, Arc::clone(&self.shared))
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.shared.registry
    }

    /// Cumulative real time at which a call counts as slow.
    pub fn method_call_threshold(&self) -> Duration {
        self.shared.threshold
    }

    pub fn real_duration_histogram(&self) -> &Arc<HistogramMetric> {
        &self.shared.real_duration
    }

    pub fn cpu_duration_histogram(&self) -> &Arc<HistogramMetric> {
        &self.shared.cpu_duration
    }
}
