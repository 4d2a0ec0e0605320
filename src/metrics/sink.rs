// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Finalized metric samples and the sinks that accept them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::labels::LabelSet;
use crate::error::Result;

/// A single finalized measurement handed to a [`MetricSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Series name, e.g. `method_calls`.
    pub series: String,
    /// Numeric fields.
    pub values: BTreeMap<String, f64>,
    /// Tags identifying the sample.
    pub tags: LabelSet,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    /// Create a sample with no values or tags.
    pub fn new(series: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            series: series.into(),
            values: BTreeMap::new(),
            tags: LabelSet::new(),
            timestamp,
        }
    }

    /// Add a numeric value.
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Replace the tags.
    pub fn with_tags(mut self, tags: LabelSet) -> Self {
        self.tags = tags;
        self
    }

    /// Look up a value.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Destination for finalized samples.
///
/// Implemented by the host runtime's transport. Errors are reported back so
/// the caller can log them, but they never reach instrumented code.
pub trait MetricSink: Send + Sync {
    /// Accept a batch of samples.
    fn submit(&self, samples: &[MetricSample]) -> Result<()>;
}

/// Sink that keeps every sample in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Mutex<Vec<MetricSample>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all samples received so far.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().clone()
    }

    /// Remove and return all samples.
    pub fn drain(&self) -> Vec<MetricSample> {
        std::mem::take(&mut *self.samples.lock())
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

impl MetricSink for MemorySink {
    fn submit(&self, samples: &[MetricSample]) -> Result<()> {
        self.samples.lock().extend_from_slice(samples);
        Ok(())
    }
}

/// Sink that writes each sample to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricSink for TracingSink {
    fn submit(&self, samples: &[MetricSample]) -> Result<()> {
        for sample in samples {
            tracing::debug!(
                series = %sample.series,
                tags = %sample.tags,
                values = ?sample.values,
                "Metric sample"
            );
        }
        Ok(())
    }
}
