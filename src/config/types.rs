// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`MetricsFileConfig`] mirrors what may appear in a config file, with every
//! field optional. [`InstrumentationConfig`] is the resolved form handed to
//! [`Instrumentation`](crate::metrics::Instrumentation).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::histogram::{validate_buckets, DEFAULT_BUCKETS};

/// Default `method_call_threshold`, in seconds.
pub const DEFAULT_METHOD_CALL_THRESHOLD: f64 = 0.1;

/// Instrumentation settings as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsFileConfig {
    /// Cumulative real time (seconds) above which a method call is reported
    #[serde(
        default,
        alias = "method_call_threshold",
        skip_serializing_if = "Option::is_none"
    )]
    pub method_call_threshold: Option<f64>,

    /// Bucket upper bounds (seconds) shared by the method-call histograms
    #[serde(
        default,
        alias = "histogram_buckets",
        skip_serializing_if = "Option::is_none"
    )]
    pub histogram_buckets: Option<Vec<f64>>,

    /// Prefix for histogram names, e.g. `gitlab` gives `gitlab_method_call_...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Fully resolved instrumentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationConfig {
    pub method_call_threshold: f64,
    pub histogram_buckets: Vec<f64>,
    pub namespace: Option<String>,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            method_call_threshold: DEFAULT_METHOD_CALL_THRESHOLD,
            histogram_buckets: DEFAULT_BUCKETS.to_vec(),
            namespace: None,
        }
    }
}

impl InstrumentationConfig {
    /// Set the method call threshold in seconds.
    pub fn with_threshold(mut self, seconds: f64) -> Self {
        self.method_call_threshold = seconds;
        self
    }

    /// Set the shared histogram bucket layout.
    pub fn with_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.histogram_buckets = buckets;
        self
    }

    /// Set the histogram name prefix.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Full histogram name for `base`, honoring the namespace.
    pub fn metric_name(&self, base: &str) -> String {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}_{base}"),
            _ => base.to_string(),
        }
    }

    /// Reject thresholds and bucket layouts that cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.method_call_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::invalid_value(
                "methodCallThreshold",
                format!("expected a non-negative number of seconds, got {threshold}"),
            ));
        }
        validate_buckets("histogramBuckets", &self.histogram_buckets)?;
        Ok(())
    }
}
