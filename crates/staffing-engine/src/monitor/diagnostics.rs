//! Per-scope monitoring counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters of one monitored scope
#[derive(Debug, Default)]
pub struct ScopeDiagnostics {
    ticks_started: AtomicU64,
    ticks_completed: AtomicU64,
    ticks_skipped: AtomicU64,
    fetch_failures: AtomicU64,
    stale_reports: AtomicU64,
    alerts_raised: AtomicU64,
}

/// Point-in-time copy of [`ScopeDiagnostics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub ticks_started: u64,
    pub ticks_completed: u64,
    pub ticks_skipped: u64,
    pub fetch_failures: u64,
    pub stale_reports: u64,
    pub alerts_raised: u64,
}

impl ScopeDiagnostics {
    pub(crate) fn tick_started(&self) {
        self.ticks_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tick_completed(&self) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_report(&self) {
        self.stale_reports.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn alert_raised(&self) {
        self.alerts_raised.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ticks_started: self.ticks_started.load(Ordering::Relaxed),
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            stale_reports: self.stale_reports.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
        }
    }
}
