// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! callmeter - method call timing for request-processing runtimes.
//!
//! Wraps individual operations, measures their wall-clock and CPU time,
//! aggregates the measurements into histograms labeled by operation and
//! request context, and flags operations whose cumulative time in a unit of
//! work reaches a configurable threshold.
//!
//! # Architecture
//!
//! - [`metrics`] - clock, labels, histograms, trackers and transaction contexts
//! - [`config`] - threshold and bucket settings, loaded from files and the environment
//! - [`telemetry`] - log subscriber setup and slow-call spans
//! - [`error`] - error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use callmeter::config::load_config;
//! use callmeter::metrics::{Instrumentation, LabelSet, MetricsRegistry, TracingSink};
//!
//! let config = load_config(".")?;
//! let instrumentation = Instrumentation::new(Arc::new(MetricsRegistry::new()), &config)?;
//!
//! // Per request
//! let mut tx = instrumentation.transaction(LabelSet::from([
//!     ("controller", "Projects::CommitController"),
//!     ("action", "show"),
//! ]));
//! let commit = tx.with_instrumentation("Repository", "commit", || repo.commit(sha));
//! let report = tx.finalize();
//! report.trace_slow_calls();
//! report.submit(&TracingSink);
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

pub use config::InstrumentationConfig;
pub use error::{ConfigError, MetricsError, Result};
pub use metrics::{
    with_instrumentation, Instrumentation, LabelSet, MethodCallTracker, MetricsRegistry,
    TransactionContext, TransactionReport,
};

/// callmeter version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
