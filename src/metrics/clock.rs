// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wall-clock and CPU-time sources.
//!
//! Readings are `Duration`s measured from an arbitrary per-process origin, so
//! only differences between two readings are meaningful. Conversion to
//! fractional seconds happens once, when a delta is handed to a histogram.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Once;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Origin for wall-clock readings.
static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

static DEGRADED_WARNING: Once = Once::new();
static CPU_DEGRADED: AtomicBool = AtomicBool::new(false);

/// A source of monotonic wall-clock and CPU-time readings.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic wall-clock reading.
    fn now_wall(&self) -> Duration;

    /// CPU time consumed by the calling thread.
    fn now_cpu(&self) -> Duration;
}

/// Clock backed by the operating system.
///
/// CPU time is the calling thread's CPU time, so a call that fans work out to
/// other threads only accounts for the time spent on the measuring thread.
/// Where thread CPU time is unavailable the clock falls back to wall time and
/// logs a single warning per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock.
    pub fn new() -> Self {
        Self
    }

    /// Whether CPU readings have fallen back to wall time in this process.
    pub fn cpu_time_degraded() -> bool {
        CPU_DEGRADED.load(Ordering::Relaxed)
    }

    fn degrade(&self, reason: &str) -> Duration {
        CPU_DEGRADED.store(true, Ordering::Relaxed);
        DEGRADED_WARNING.call_once(|| {
            tracing::warn!(reason, "Thread CPU time unavailable, reporting wall time as CPU time");
        });
        self.now_wall()
    }
}

impl Clock for SystemClock {
    fn now_wall(&self) -> Duration {
        PROCESS_START.elapsed()
    }

    #[cfg(unix)]
    fn now_cpu(&self) -> Duration {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
        if rc != 0 {
            return self.degrade("clock_gettime(CLOCK_THREAD_CPUTIME_ID) failed");
        }
        Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
    }

    #[cfg(not(unix))]
    fn now_cpu(&self) -> Duration {
        self.degrade("platform has no thread CPU clock")
    }
}

/// A clock that only moves when told to.
///
/// Lets hosts and tests inject exact durations: advance the clock from inside
/// the wrapped operation and the tracker records exactly that amount.
#[derive(Debug, Default)]
pub struct ManualClock {
    wall_nanos: AtomicU64,
    cpu_nanos: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading zero on both axes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance wall and CPU time by the same amount.
    pub fn advance(&self, elapsed: Duration) {
        self.advance_split(elapsed, elapsed);
    }

    /// Advance wall and CPU time independently.
    pub fn advance_split(&self, wall: Duration, cpu: Duration) {
        self.wall_nanos.fetch_add(as_nanos(wall), Ordering::SeqCst);
        self.cpu_nanos.fetch_add(as_nanos(cpu), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_wall(&self) -> Duration {
        Duration::from_nanos(self.wall_nanos.load(Ordering::SeqCst))
    }

    fn now_cpu(&self) -> Duration {
        Duration::from_nanos(self.cpu_nanos.load(Ordering::SeqCst))
    }
}

fn as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Elapsed time between two readings, clamped at zero.
pub(crate) fn elapsed_between(start: Duration, end: Duration) -> Duration {
    end.saturating_sub(start)
}
