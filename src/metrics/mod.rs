// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Method call instrumentation.
//!
//! Measures wall-clock and CPU time of individual operations, aggregates them
//! into label-keyed histograms, and flags operations whose cumulative time in
//! a transaction reaches a threshold.
//!
//! - [`Clock`] - wall and thread CPU time sources
//! - [`LabelSet`] - series identity
//! - [`HistogramMetric`] / [`MetricsRegistry`] - shared, concurrently written aggregates
//! - [`MethodCallTracker`] - per-operation timing inside one transaction
//! - [`TransactionContext`] - per-unit-of-work envelope, finalized into a [`TransactionReport`]
//! - [`Instrumentation`] - creates transaction contexts
//!
//! Conventions: buckets are cumulative (`value <= bound`) with an implicit
//! `+Inf` bucket; CPU time is the measuring thread's CPU time only.

mod clock;
pub mod histogram;
mod instrumentation;
mod labels;
mod method_call;
mod registry;
mod sink;
mod transaction;
mod transaction_id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use histogram::{
    Bucket, HistogramMetric, HistogramSnapshot, SeriesSnapshot, DEFAULT_BUCKETS,
};
pub use instrumentation::{Instrumentation, CPU_DURATION_METRIC, REAL_DURATION_METRIC};
pub use labels::LabelSet;
pub use method_call::{MethodCallTiming, MethodCallTracker, OperationId, METHOD_CALLS_SERIES};
pub use registry::{MetricsRegistry, GLOBAL_REGISTRY};
pub use sink::{MemorySink, MetricSample, MetricSink, TracingSink};
pub use transaction::{with_instrumentation, TransactionContext, TransactionReport};
pub use transaction_id::TransactionId;
