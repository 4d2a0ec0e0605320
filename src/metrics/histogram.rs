// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Label-keyed histograms with fixed cumulative buckets.
//!
//! Each bucket counts every observation less than or equal to its upper
//! bound, and an implicit `+Inf` bucket counts every observation. Series are
//! created lazily per label set and each one sits behind its own lock, so
//! concurrent observers of different series never contend and observers of
//! the same series never lose an increment.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::labels::LabelSet;
use crate::error::MetricsError;

/// Default bucket layout for method-call durations, in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0];

/// Check that bucket bounds are non-empty, finite and strictly increasing.
pub fn validate_buckets(name: &str, bounds: &[f64]) -> Result<(), MetricsError> {
    if bounds.is_empty() {
        return Err(MetricsError::invalid_buckets(name, "at least one bucket is required"));
    }
    if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(MetricsError::invalid_buckets(
            name,
            format!("bucket bound {bad} is not finite"),
        ));
    }
    if let Some(pair) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MetricsError::invalid_buckets(
            name,
            format!("bounds must be strictly increasing, got {} then {}", pair[0], pair[1]),
        ));
    }
    Ok(())
}

/// Accumulator for one label set.
#[derive(Debug)]
struct SeriesState {
    /// One counter per finite bound, then the `+Inf` counter.
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

impl SeriesState {
    fn new(bucket_count: usize) -> Self {
        Self {
            counts: vec![0; bucket_count + 1],
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, bounds: &[f64], value: f64) {
        for (counter, bound) in self.counts.iter_mut().zip(bounds) {
            if value <= *bound {
                *counter += 1;
            }
        }
        if let Some(inf) = self.counts.last_mut() {
            *inf += 1;
        }
        self.sum += value;
        self.count += 1;
    }
}

/// A named histogram, shared process-wide and written concurrently.
#[derive(Debug)]
pub struct HistogramMetric {
    name: String,
    description: String,
    bounds: Vec<f64>,
    series: RwLock<HashMap<LabelSet, Arc<Mutex<SeriesState>>>>,
    invalid_observations: AtomicU64,
}

impl HistogramMetric {
    /// Create a histogram after validating its bucket layout.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        bounds: Vec<f64>,
    ) -> Result<Self, MetricsError> {
        let name = name.into();
        validate_buckets(&name, &bounds)?;
        Ok(Self {
            name,
            description: description.into(),
            bounds,
            series: RwLock::new(HashMap::new()),
            invalid_observations: AtomicU64::new(0),
        })
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Upper bounds of the finite buckets.
    pub fn buckets(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of samples dropped because they were negative or not finite.
    pub fn invalid_observations(&self) -> u64 {
        self.invalid_observations.load(Ordering::Relaxed)
    }

    /// Record `value` into the series for `labels`.
    ///
    /// Never fails. Negative or non-finite values are dropped and counted.
    pub fn observe(&self, labels: &LabelSet, value: f64) {
        if !value.is_finite() || value < 0.0 {
            let previous = self.invalid_observations.fetch_add(1, Ordering::Relaxed);
            if previous == 0 {
                tracing::warn!(metric = %self.name, value, "Dropping invalid histogram observation");
            }
            return;
        }

        let series = self.series_for(labels);
        series.lock().observe(&self.bounds, value);
    }

    fn series_for(&self, labels: &LabelSet) -> Arc<Mutex<SeriesState>> {
        if let Some(series) = self.series.read().get(labels) {
            return Arc::clone(series);
        }

        let mut all = self.series.write();
        let bucket_count = self.bounds.len();
        Arc::clone(
            all.entry(labels.clone())
                .or_insert_with(|| Arc::new(Mutex::new(SeriesState::new(bucket_count)))),
        )
    }

    /// Number of distinct label sets observed so far.
    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }

    /// Snapshot of a single series.
    pub fn series_snapshot(&self, labels: &LabelSet) -> Option<SeriesSnapshot> {
        let series = self.series.read().get(labels).map(Arc::clone)?;
        let state = series.lock();
        Some(self.snapshot_state(labels.clone(), &state))
    }

    /// Snapshot of every series, ordered by label set.
    ///
    /// Each series is read under its own lock; different series may be read
    /// at slightly different moments while writers are active.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let entries: Vec<(LabelSet, Arc<Mutex<SeriesState>>)> = self
            .series
            .read()
            .iter()
            .map(|(labels, series)| (labels.clone(), Arc::clone(series)))
            .collect();

        let mut series: Vec<SeriesSnapshot> = entries
            .into_iter()
            .map(|(labels, state)| {
                let state = state.lock();
                self.snapshot_state(labels, &state)
            })
            .collect();
        series.sort_by(|a, b| a.labels.cmp(&b.labels));

        HistogramSnapshot {
            name: self.name.clone(),
            description: self.description.clone(),
            buckets: self.bounds.clone(),
            series,
            invalid_observations: self.invalid_observations(),
        }
    }

    fn snapshot_state(&self, labels: LabelSet, state: &SeriesState) -> SeriesSnapshot {
        let buckets = self
            .bounds
            .iter()
            .zip(&state.counts)
            .map(|(&le, &count)| Bucket { le, count })
            .collect();
        SeriesSnapshot {
            labels,
            buckets,
            inf_count: state.counts.last().copied().unwrap_or(0),
            sum: state.sum,
            count: state.count,
        }
    }
}

/// One cumulative bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Upper bound (inclusive).
    pub le: f64,
    /// Observations less than or equal to `le`.
    pub count: u64,
}

/// Point-in-time state of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub labels: LabelSet,
    /// Finite buckets in ascending order.
    pub buckets: Vec<Bucket>,
    /// The `+Inf` bucket.
    pub inf_count: u64,
    pub sum: f64,
    pub count: u64,
}

impl SeriesSnapshot {
    /// Count of the bucket with upper bound `le`, if there is one.
    pub fn bucket_count(&self, le: f64) -> Option<u64> {
        self.buckets.iter().find(|b| b.le == le).map(|b| b.count)
    }

    /// Upper-bound estimate for quantile `q` (0.0 to 1.0).
    ///
    /// Returns the smallest bucket bound whose cumulative count reaches
    /// `q * count`, or `f64::INFINITY` if that only happens in `+Inf`.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.count == 0 || !(0.0..=1.0).contains(&q) {
            return None;
        }
        let target = ((self.count as f64) * q).ceil().max(1.0) as u64;
        let bound = self
            .buckets
            .iter()
            .find(|b| b.count >= target)
            .map_or(f64::INFINITY, |b| b.le);
        Some(bound)
    }

    /// Mean observed value.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Point-in-time state of a whole histogram, ready for an exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    pub name: String,
    pub description: String,
    pub buckets: Vec<f64>,
    pub series: Vec<SeriesSnapshot>,
    pub invalid_observations: u64,
}

impl HistogramSnapshot {
    /// Find the series for an exact label set.
    pub fn series(&self, labels: &LabelSet) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|s| &s.labels == labels)
    }

    /// Total observations across all series.
    pub fn total_count(&self) -> u64 {
        self.series.iter().map(|s| s.count).sum()
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
