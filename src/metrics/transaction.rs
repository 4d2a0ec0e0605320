// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-unit-of-work transaction contexts and their reports.
//!
//! A [`TransactionContext`] is created when a request or job starts, owns one
//! [`MethodCallTracker`] per instrumented operation, and is consumed by
//! [`TransactionContext::finalize`] into an immutable [`TransactionReport`].
//! Because `finalize` takes the context by value, nothing can ask it for a
//! tracker once it has been reported.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clock::elapsed_between;
use super::instrumentation::Shared;
use super::labels::LabelSet;
use super::method_call::{MethodCallTiming, MethodCallTracker, OperationId};
use super::sink::{MetricSample, MetricSink};
use super::transaction_id::TransactionId;
use crate::telemetry::slow_call_span;

/// Timing state for one unit of work.
#[derive(Debug)]
pub struct TransactionContext {
    id: TransactionId,
    labels: LabelSet,
    started_at: DateTime<Utc>,
    start_wall: Duration,
    trackers: BTreeMap<OperationId, MethodCallTracker>,
    shared: Arc<Shared>,
}

impl TransactionContext {
    pub(crate) fn new(labels: LabelSet, shared: Arc<Shared>) -> Self {
        let id = TransactionId::new();
        tracing::debug!(transaction = %id.short(), labels = %labels, "Transaction started");
        Self {
            id,
            labels,
            started_at: Utc::now(),
            start_wall: shared.clock.now_wall(),
            trackers: BTreeMap::new(),
            shared,
        }
    }

    /// Use an id assigned by the host runtime instead of a random one.
    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Ambient labels applied to every observation in this transaction.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Tracker for `module#method`, created on first request.
    pub fn get_tracker(&mut self, module: &str, method: &str) -> &mut MethodCallTracker {
        let operation = OperationId::new(module, method);
        let labels = &self.labels;
        let shared = &self.shared;
        self.trackers.entry(operation).or_insert_with_key(|operation| {
            tracing::debug!(method = %operation, "Tracking method call");
            MethodCallTracker::new(operation.clone(), labels, Arc::clone(shared))
        })
    }

    /// Existing tracker for `module#method`, without creating one.
    pub fn tracker(&self, module: &str, method: &str) -> Option<&MethodCallTracker> {
        self.trackers.get(&OperationId::new(module, method))
    }

    /// All trackers, ordered by module then method.
    pub fn trackers(&self) -> impl Iterator<Item = &MethodCallTracker> {
        self.trackers.values()
    }

    /// Measure one call of `module#method`.
    pub fn with_instrumentation<R>(
        &mut self,
        module: &str,
        method: &str,
        operation: impl FnOnce() -> R,
    ) -> R {
        self.get_tracker(module, method).measure(operation)
    }

    /// Close the transaction and produce its report.
    pub fn finalize(self) -> TransactionReport {
        let duration = elapsed_between(self.start_wall, self.shared.clock.now_wall());
        let calls: Vec<MethodCallTiming> = self.trackers.values().map(|t| t.timing()).collect();

        let report = TransactionReport {
            id: self.id,
            labels: self.labels,
            started_at: self.started_at,
            finalized_at: Utc::now(),
            duration,
            threshold: self.shared.threshold,
            calls,
        };
        tracing::debug!(
            transaction = %report.id.short(),
            methods = report.calls.len(),
            slow = report.slow_calls().count(),
            duration_ms = duration.as_secs_f64() * 1000.0,
            "Transaction finalized"
        );
        report
    }
}

/// Measure one call of `module#method` inside `context`.
///
/// Equivalent to [`TransactionContext::with_instrumentation`]; exists for
/// installation code that wraps call sites generically.
pub fn with_instrumentation<R>(
    context: &mut TransactionContext,
    module: &str,
    method: &str,
    operation: impl FnOnce() -> R,
) -> R {
    context.with_instrumentation(module, method, operation)
}

/// Immutable result of a finished transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReport {
    pub id: TransactionId,
    pub labels: LabelSet,
    pub started_at: DateTime<Utc>,
    pub finalized_at: DateTime<Utc>,
    /// Wall time between creation and finalize.
    pub duration: Duration,
    pub threshold: Duration,
    /// One entry per operation, ordered by module then method.
    pub calls: Vec<MethodCallTiming>,
}

impl TransactionReport {
    /// Timing for a specific operation.
    pub fn call(&self, module: &str, method: &str) -> Option<&MethodCallTiming> {
        self.calls
            .iter()
            .find(|c| c.module == module && c.method == method)
    }

    /// Operations whose accumulated real time reached the threshold.
    pub fn slow_calls(&self) -> impl Iterator<Item = &MethodCallTiming> {
        self.calls.iter().filter(|c| c.above_threshold)
    }

    /// Samples for the slow operations, tagged with the transaction labels.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.slow_calls()
            .map(|call| {
                let mut sample = call.to_sample(self.finalized_at);
                sample.tags = self.labels.merge(&sample.tags);
                sample
            })
            .collect()
    }

    /// Hand the slow-call samples to `sink`.
    ///
    /// Returns the number of samples accepted. A failing sink is logged and
    /// counts as zero.
    pub fn submit(&self, sink: &dyn MetricSink) -> usize {
        let samples = self.samples();
        if samples.is_empty() {
            return 0;
        }
        match sink.submit(&samples) {
            Ok(()) => samples.len(),
            Err(err) => {
                tracing::warn!(
                    transaction = %self.id.short(),
                    samples = samples.len(),
                    error = %err,
                    "Metric sink rejected samples"
                );
                0
            }
        }
    }

    /// Emit one `method_call` span per slow operation.
    pub fn trace_slow_calls(&self) {
        for call in self.slow_calls() {
            let span = slow_call_span(call, &self.id);
            tracing::info!(parent: &span, "Slow method call");
        }
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstrumentationConfig;
    use crate::metrics::{Instrumentation, ManualClock, MemorySink, MetricsRegistry};

    fn setup() -> (Instrumentation, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let instrumentation = Instrumentation::with_clock(
            Arc::new(MetricsRegistry::new()),
            &InstrumentationConfig::default(),
            clock.clone(),
        )
        .unwrap();
        (instrumentation, clock)
    }

    struct FailingSink;

    impl MetricSink for FailingSink {
        fn submit(&self, _samples: &[MetricSample]) -> anyhow::Result<()> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[test]
    fn test_get_tracker_reuses_identity() {
        let (instrumentation, clock) = setup();
        let mut tx = instrumentation.transaction(LabelSet::new());

        tx.get_tracker("User", "sign_in")
            .measure(|| clock.advance(Duration::from_millis(5)));
        tx.get_tracker("User", "sign_in")
            .measure(|| clock.advance(Duration::from_millis(5)));
        tx.get_tracker("User", "sign_out");

        assert_eq!(tx.trackers().count(), 2);
        let tracker = tx.tracker("User", "sign_in").unwrap();
        assert_eq!(tracker.call_count(), 2);
        assert_eq!(tracker.real_time(), Duration::from_millis(10));
        assert!(tx.tracker("User", "missing").is_none());
    }

    #[test]
    fn test_labels_fixed_at_creation() {
        let (instrumentation, _clock) = setup();
        let labels = LabelSet::from([("controller", "Commits"), ("action", "show")]);
        let tx = instrumentation.transaction(labels.clone());
        assert_eq!(tx.labels(), &labels);
    }

    #[test]
    fn test_with_instrumentation_free_function() {
        let (instrumentation, clock) = setup();
        let mut tx = instrumentation.transaction(LabelSet::new());

        let out = with_instrumentation(&mut tx, "Commit", "diffs", || {
            clock.advance(Duration::from_millis(3));
            "diff"
        });

        assert_eq!(out, "diff");
        assert_eq!(tx.tracker("Commit", "diffs").unwrap().call_count(), 1);
    }

    #[test]
    fn test_finalize_report() {
        let (instrumentation, clock) = setup();
        let labels = LabelSet::from([("controller", "Commits"), ("action", "show")]);
        let mut tx = instrumentation.transaction(labels.clone());
        let id = tx.id();

        tx.with_instrumentation("Repository", "commit", || clock.advance(Duration::from_millis(150)));
        tx.with_instrumentation("Commit", "diffs", || clock.advance(Duration::from_millis(20)));
        clock.advance(Duration::from_millis(30));

        let report = tx.finalize();
        assert_eq!(report.id, id);
        assert_eq!(report.labels, labels);
        assert_eq!(report.duration, Duration::from_millis(200));
        assert_eq!(report.threshold, Duration::from_millis(100));

        // Ordered by module then method
        let names: Vec<&str> = report.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Commit#diffs", "Repository#commit"]);

        let slow: Vec<&str> = report.slow_calls().map(|c| c.name.as_str()).collect();
        assert_eq!(slow, vec!["Repository#commit"]);
        assert!(!report.call("Commit", "diffs").unwrap().above_threshold);
    }

    #[test]
    fn test_samples_only_for_slow_calls() {
        let (instrumentation, clock) = setup();
        let mut tx = instrumentation.transaction(LabelSet::from([("controller", "Commits")]));
        tx.with_instrumentation("Repository", "commit", || clock.advance(Duration::from_millis(150)));
        tx.with_instrumentation("Commit", "diffs", || clock.advance(Duration::from_millis(20)));

        let report = tx.finalize();
        let samples = report.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].tags.get("method"), Some("Repository#commit"));
        assert_eq!(samples[0].tags.get("controller"), Some("Commits"));
        assert_eq!(samples[0].timestamp, report.finalized_at);
    }

    #[test]
    fn test_submit_to_sink() {
        let (instrumentation, clock) = setup();
        let mut tx = instrumentation.transaction(LabelSet::new());
        tx.with_instrumentation("Repository", "commit", || clock.advance(Duration::from_millis(150)));
        let report = tx.finalize();

        let sink = MemorySink::new();
        assert_eq!(report.submit(&sink), 1);
        assert_eq!(sink.len(), 1);

        // Sink failures stay inside the report
        assert_eq!(report.submit(&FailingSink), 0);
    }

    #[test]
    fn test_submit_without_slow_calls_skips_sink() {
        let (instrumentation, _clock) = setup();
        let report = instrumentation.transaction(LabelSet::new()).finalize();

        assert!(report.calls.is_empty());
        assert_eq!(report.submit(&FailingSink), 0);
    }

    #[test]
    fn test_trace_slow_calls_and_json() {
        let (instrumentation, clock) = setup();
        let mut tx = instrumentation.transaction(LabelSet::from([("action", "show")]));
        tx.with_instrumentation("Repository", "commit", || clock.advance(Duration::from_millis(150)));
        let report = tx.finalize();

        report.trace_slow_calls();

        let json = report.to_json().unwrap();
        assert!(json.contains("Repository#commit"));
        let parsed: TransactionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_with_id() {
        let (instrumentation, _clock) = setup();
        let id = TransactionId::new();
        let tx = instrumentation.transaction(LabelSet::new()).with_id(id);
        assert_eq!(tx.id(), id);
        assert_eq!(tx.finalize().id, id);
    }
}
