// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Timing of instrumented method calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock::elapsed_between;
use super::instrumentation::Shared;
use super::labels::LabelSet;
use super::sink::MetricSample;

/// Series name used for slow method call samples.
pub const METHOD_CALLS_SERIES: &str = "method_calls";

/// Identity of an instrumented operation within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId {
    pub module: String,
    pub method: String,
}

impl OperationId {
    pub fn new(module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
        }
    }

    /// `{module, method}` labels for histogram series.
    pub fn labels(&self) -> LabelSet {
        LabelSet::new()
            .with("module", self.module.as_str())
            .with("method", self.method.as_str())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.module, self.method)
    }
}

/// Accumulated timing of one operation within one transaction.
///
/// Owned by its [`TransactionContext`](super::TransactionContext) and used from
/// one thread at a time; only the histograms it writes into are shared.
#[derive(Debug)]
pub struct MethodCallTracker {
    operation: OperationId,
    name: String,
    /// Transaction labels merged with the operation's own labels.
    series_labels: LabelSet,
    real_time: Duration,
    cpu_time: Duration,
    call_count: u64,
    shared: Arc<Shared>,
}

impl MethodCallTracker {
    pub(crate) fn new(operation: OperationId, ambient: &LabelSet, shared: Arc<Shared>) -> Self {
        let series_labels = ambient.merge(&operation.labels());
        Self {
            name: operation.to_string(),
            operation,
            series_labels,
            real_time: Duration::ZERO,
            cpu_time: Duration::ZERO,
            call_count: 0,
            shared,
        }
    }

    pub fn operation(&self) -> &OperationId {
        &self.operation
    }

    /// Full name such as `User#sign_in`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `{module, method}` labels.
    pub fn labels(&self) -> LabelSet {
        self.operation.labels()
    }

    /// Labels used for histogram observations.
    pub fn series_labels(&self) -> &LabelSet {
        &self.series_labels
    }

    /// Accumulated wall-clock time.
    pub fn real_time(&self) -> Duration {
        self.real_time
    }

    /// Accumulated CPU time of the measuring thread.
    pub fn cpu_time(&self) -> Duration {
        self.cpu_time
    }

    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Runs `operation` once and records how long it took.
    ///
    /// Whatever `operation` returns is handed back untouched, `Err` included.
    /// If it panics, the time spent up to the panic is recorded before the
    /// panic continues to unwind.
    pub fn measure<R>(&mut self, operation: impl FnOnce() -> R) -> R {
        let measurement = Measurement::start(self);
        let result = operation();
        drop(measurement);
        result
    }

    /// Whether the accumulated real time reached the configured threshold.
    ///
    /// A tracker that never measured anything is never above it, even with a
    /// zero threshold.
    pub fn above_threshold(&self) -> bool {
        self.call_count > 0 && self.real_time >= self.shared.threshold
    }

    /// Plain snapshot of the accumulated timing.
    pub fn timing(&self) -> MethodCallTiming {
        MethodCallTiming {
            module: self.operation.module.clone(),
            method: self.operation.method.clone(),
            name: self.name.clone(),
            real_time: self.real_time,
            cpu_time: self.cpu_time,
            call_count: self.call_count,
            above_threshold: self.above_threshold(),
        }
    }

    /// Sample on the `method_calls` series describing this call.
    pub fn to_sample(&self, timestamp: DateTime<Utc>) -> MetricSample {
        self.timing().to_sample(timestamp)
    }

    fn record(&mut self, real: Duration, cpu: Duration) {
        self.real_time += real;
        self.cpu_time += cpu;
        self.call_count += 1;

        self.shared
            .real_duration
            .observe(&self.series_labels, real.as_secs_f64());
        self.shared
            .cpu_duration
            .observe(&self.series_labels, cpu.as_secs_f64());
    }
}

/// In-flight measurement; records on drop so unwinding is accounted for too.
struct Measurement<'a> {
    tracker: &'a mut MethodCallTracker,
    start_wall: Duration,
    start_cpu: Duration,
}

impl<'a> Measurement<'a> {
    fn start(tracker: &'a mut MethodCallTracker) -> Self {
        let clock = &tracker.shared.clock;
        let start_wall = clock.now_wall();
        let start_cpu = clock.now_cpu();
        Self {
            tracker,
            start_wall,
            start_cpu,
        }
    }
}

impl Drop for Measurement<'_> {
    fn drop(&mut self) {
        let clock = &self.tracker.shared.clock;
        let real = elapsed_between(self.start_wall, clock.now_wall());
        let cpu = elapsed_between(self.start_cpu, clock.now_cpu());
        if std::thread::panicking() {
            tracing::debug!(method = %self.tracker.name, "Recording timing of panicking call");
        }
        self.tracker.record(real, cpu);
    }
}

/// Accumulated timing of one operation, detached from its transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCallTiming {
    pub module: String,
    pub method: String,
    pub name: String,
    pub real_time: Duration,
    pub cpu_time: Duration,
    pub call_count: u64,
    pub above_threshold: bool,
}

impl MethodCallTiming {
    /// Sample with `duration`, `cpu_duration` (seconds) and `call_count`,
    /// tagged with `method = Module#method`.
    pub fn to_sample(&self, timestamp: DateTime<Utc>) -> MetricSample {
        MetricSample::new(METHOD_CALLS_SERIES, timestamp)
            .with_value("duration", self.real_time.as_secs_f64())
            .with_value("cpu_duration", self.cpu_time.as_secs_f64())
            .with_value("call_count", self.call_count as f64)
            .with_tags(LabelSet::new().with("method", self.name.as_str()))
    }
}
