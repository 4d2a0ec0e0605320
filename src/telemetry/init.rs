// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Log subscriber setup for hosts and tools that embed callmeter.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the host's call. This is the default one.

use std::io;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One line per event.
    #[default]
    Compact,
    /// Multi-line, human oriented.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Configuration for [`init_telemetry`].
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level used when neither `filter_directive` nor `RUST_LOG` is set.
    pub default_level: Level,

    pub format: LogFormat,

    /// Log span close events, which carry `method_call` span fields.
    pub span_events: bool,

    pub include_file_line: bool,

    pub include_target: bool,

    pub ansi_colors: bool,

    /// Explicit filter such as `callmeter=debug`; takes precedence over `RUST_LOG`.
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            format: LogFormat::Compact,
            span_events: false,
            include_file_line: false,
            include_target: true,
            ansi_colors: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Verbose, human readable output.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            format: LogFormat::Pretty,
            span_events: true,
            include_file_line: true,
            ..Self::default()
        }
    }

    /// Warnings and above as JSON.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            format: LogFormat::Json,
            include_target: false,
            ansi_colors: false,
            ..Self::default()
        }
    }

    /// Everything from this crate, no colors.
    pub fn testing() -> Self {
        Self {
            default_level: Level::TRACE,
            span_events: true,
            include_file_line: true,
            ansi_colors: false,
            filter_directive: Some("callmeter=trace".to_string()),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_level.to_string());
        match &self.filter_directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = fmt::layer()
            .with_ansi(self.ansi_colors)
            .with_target(self.include_target)
            .with_file(self.include_file_line)
            .with_line_number(self.include_file_line)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
        }
    }
}

/// Returned by [`init_telemetry`]; keep it alive for the duration of the program.
#[must_use]
pub struct TelemetryGuard {
    _private: (),
}

/// Install the global log subscriber.
///
/// Fails if a global subscriber is already installed.
///
/// ```rust,ignore
/// use callmeter::telemetry::{init_telemetry, TelemetryConfig};
///
/// let _guard = init_telemetry(&TelemetryConfig::production())?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}
