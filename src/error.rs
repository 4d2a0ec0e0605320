// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for callmeter.
//!
//! Registration and configuration problems are surfaced as strongly-typed
//! errors using `thiserror`. Nothing that happens while measuring a call is
//! ever returned to the instrumented code; those failures are logged instead.

use thiserror::Error;

/// Errors raised while registering histograms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Histogram {name} already registered with buckets {registered:?}, requested {requested:?}")]
    BucketMismatch {
        name: String,
        registered: Vec<f64>,
        requested: Vec<f64>,
    },

    #[error("Invalid buckets for {name}: {reason}")]
    InvalidBuckets { name: String, reason: String },

    #[error("Invalid method call threshold: {0} seconds")]
    InvalidThreshold(f64),
}

impl MetricsError {
    /// Create an invalid-buckets error.
    pub fn invalid_buckets(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBuckets {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The histogram name or setting the error refers to.
    pub fn subject(&self) -> &str {
        match self {
            Self::BucketMismatch { name, .. } | Self::InvalidBuckets { name, .. } => name,
            Self::InvalidThreshold(_) => "methodCallThreshold",
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    /// Create an invalid-value error for a named field.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl From<MetricsError> for ConfigError {
    fn from(err: MetricsError) -> Self {
        Self::invalid_value(err.subject(), err.to_string())
    }
}

/// Result type alias using anyhow for collaborator boundaries.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_mismatch_display() {
        let err = MetricsError::BucketMismatch {
            name: "latency".to_string(),
            registered: vec![0.1, 1.0],
            requested: vec![0.5],
        };
        let display = err.to_string();
        assert!(display.contains("latency"));
        assert!(display.contains("0.1"));
        assert!(display.contains("0.5"));
        assert_eq!(err.subject(), "latency");
        assert_eq!(MetricsError::InvalidThreshold(-1.0).subject(), "methodCallThreshold");
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::NotFound(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let json_err = result.unwrap_err();
        let config_err: ConfigError = json_err.into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_config_error_from_metrics_error() {
        let err = MetricsError::invalid_buckets("histogramBuckets", "must not be empty");
        let config_err: ConfigError = err.into();
        match config_err {
            ConfigError::InvalidValue { field, message } => {
                assert_eq!(field, "histogramBuckets");
                assert!(message.contains("must not be empty"));
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }
}
