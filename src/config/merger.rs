// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use super::types::{InstrumentationConfig, MetricsFileConfig};

/// Environment variable overriding `method_call_threshold`.
pub const ENV_THRESHOLD: &str = "CALLMETER_METHOD_CALL_THRESHOLD";

/// Environment variable overriding `namespace`.
pub const ENV_NAMESPACE: &str = "CALLMETER_NAMESPACE";

/// Overrides taken from the process environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub method_call_threshold: Option<f64>,
    pub namespace: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    ///
    /// An unparsable threshold is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let method_call_threshold = lookup(ENV_THRESHOLD).and_then(|raw| {
            match raw.trim().parse::<f64>() {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(var = ENV_THRESHOLD, value = %raw, error = %err, "Ignoring unparsable threshold");
                    None
                }
            }
        });

        Self {
            method_call_threshold,
            namespace: lookup(ENV_NAMESPACE).filter(|ns| !ns.is_empty()),
        }
    }
}

/// Merge configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment overrides
/// 2. Local config (.callmeter.local.json)
/// 3. Workspace config (.callmeter.json)
/// 4. Default values
pub fn merge_config(
    workspace: Option<MetricsFileConfig>,
    local: Option<MetricsFileConfig>,
    env: EnvOverrides,
) -> InstrumentationConfig {
    let mut result = InstrumentationConfig::default();

    for config in [workspace, local].into_iter().flatten() {
        apply_file_config(&mut result, config);
    }

    if let Some(threshold) = env.method_call_threshold {
        result.method_call_threshold = threshold;
    }
    if env.namespace.is_some() {
        result.namespace = env.namespace;
    }

    result
}

fn apply_file_config(result: &mut InstrumentationConfig, config: MetricsFileConfig) {
    if let Some(threshold) = config.method_call_threshold {
        result.method_call_threshold = threshold;
    }
    if let Some(buckets) = config.histogram_buckets {
        result.histogram_buckets = buckets;
    }
    if config.namespace.is_some() {
        result.namespace = config.namespace;
    }
}
