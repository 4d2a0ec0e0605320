// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process-wide registry of named histograms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use super::histogram::{validate_buckets, HistogramMetric, HistogramSnapshot};
use crate::error::MetricsError;

/// Default registry for hosts that want a single process-wide instance.
///
/// The instrumentation core never reaches for this on its own; it is handed
/// to [`Instrumentation`](super::Instrumentation) like any other registry.
pub static GLOBAL_REGISTRY: Lazy<Arc<MetricsRegistry>> =
    Lazy::new(|| Arc::new(MetricsRegistry::new()));

/// Owns every histogram by name.
///
/// The first registration of a name fixes its bucket layout for the life of
/// the registry.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    histograms: RwLock<HashMap<String, Arc<HistogramMetric>>>,
    /// Names for which a layout mismatch has already been logged.
    reported_mismatches: Mutex<HashSet<String>>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the histogram registered under `name`, creating it on first use.
    ///
    /// Asking again with a different bucket layout returns
    /// [`MetricsError::BucketMismatch`]; the registered layout stays in place
    /// and the mismatch is logged once per name.
    pub fn get_or_create(
        &self,
        name: &str,
        description: &str,
        buckets: &[f64],
    ) -> Result<Arc<HistogramMetric>, MetricsError> {
        validate_buckets(name, buckets)?;

        if let Some(existing) = self.histograms.read().get(name) {
            return self.check_layout(existing, buckets);
        }

        let mut histograms = self.histograms.write();
        if let Some(existing) = histograms.get(name) {
            return self.check_layout(existing, buckets);
        }

        let histogram = Arc::new(HistogramMetric::new(name, description, buckets.to_vec())?);
        histograms.insert(name.to_string(), Arc::clone(&histogram));
        tracing::debug!(metric = name, buckets = ?buckets, "Registered histogram");
        Ok(histogram)
    }

    fn check_layout(
        &self,
        existing: &Arc<HistogramMetric>,
        requested: &[f64],
    ) -> Result<Arc<HistogramMetric>, MetricsError> {
        if existing.buckets() == requested {
            return Ok(Arc::clone(existing));
        }

        if self.reported_mismatches.lock().insert(existing.name().to_string()) {
            tracing::warn!(
                metric = existing.name(),
                registered = ?existing.buckets(),
                requested = ?requested,
                "Histogram re-registered with different buckets, keeping the original layout"
            );
        }

        Err(MetricsError::BucketMismatch {
            name: existing.name().to_string(),
            registered: existing.buckets().to_vec(),
            requested: requested.to_vec(),
        })
    }

    /// Look up a registered histogram handle.
    pub fn get(&self, name: &str) -> Option<Arc<HistogramMetric>> {
        self.histograms.read().get(name).map(Arc::clone)
    }

    /// Current state of the histogram `name`.
    pub fn histogram(&self, name: &str) -> Option<HistogramSnapshot> {
        self.get(name).map(|h| h.snapshot())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.histograms.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot every histogram, sorted by name.
    pub fn snapshot(&self) -> Vec<HistogramSnapshot> {
        let mut histograms: Vec<Arc<HistogramMetric>> =
            self.histograms.read().values().map(Arc::clone).collect();
        histograms.sort_by(|a, b| a.name().cmp(b.name()));
        histograms.iter().map(|h| h.snapshot()).collect()
    }
}
