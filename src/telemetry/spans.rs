// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span helpers for reporting slow method calls.

use tracing::{info_span, Span};

use crate::metrics::{MethodCallTiming, TransactionId};

/// Span describing one slow method call of a finished transaction.
pub fn slow_call_span(call: &MethodCallTiming, transaction: &TransactionId) -> Span {
    info_span!(
        "method_call",
        transaction = %transaction.short(),
        method = %call.name,
        duration_ms = call.real_time.as_secs_f64() * 1000.0,
        cpu_ms = call.cpu_time.as_secs_f64() * 1000.0,
        calls = call.call_count,
    )
}
