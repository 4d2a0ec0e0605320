// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging setup and span helpers.
//!
//! - [`init_telemetry`] installs a `tracing-subscriber` stack for the host
//! - [`slow_call_span`] builds the span a slow method call is reported under
//!
//! Everything in [`crate::metrics`] logs through `tracing` and works with or
//! without a subscriber installed.

mod init;
mod spans;

pub use init::{init_telemetry, LogFormat, TelemetryConfig, TelemetryGuard};
pub use spans::slow_call_span;
