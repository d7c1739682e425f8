/*!
 * Guard Metrics
 * Lock-free counters for guarded calls, timeouts and abandoned threads
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the guards of one `SafeFileSystem`
#[derive(Debug, Default)]
pub struct GuardMetrics {
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    hangs: AtomicU64,
    process_timeouts: AtomicU64,
    retries: AtomicU64,
    exhausted: AtomicU64,
    kills: AtomicU64,
    abandoned_threads: AtomicU64,
}

/// Point-in-time copy of [`GuardMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardStats {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    /// Thread-guarded calls that hit their deadline
    pub hangs: u64,
    /// Process-guarded attempts that hit their deadline
    pub process_timeouts: u64,
    pub retries: u64,
    pub exhausted: u64,
    /// Worker process groups killed on deadline
    pub kills: u64,
    /// Abandoned guard threads that have not finished yet
    pub abandoned_threads: u64,
}

impl GuardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_hang(&self) {
        self.hangs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_process_timeout(&self) {
        self.process_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_kill(&self) {
        self.kills.fetch_add(1, Ordering::Relaxed);
    }

    /// A guard thread was left running past its deadline
    #[inline]
    pub fn thread_abandoned(&self) {
        self.abandoned_threads.fetch_add(1, Ordering::AcqRel);
    }

    /// An abandoned guard thread finished or was reclaimed
    #[inline]
    pub fn abandoned_thread_finished(&self) {
        self.abandoned_threads.fetch_sub(1, Ordering::AcqRel);
    }

    /// Abandoned guard threads still running
    pub fn abandoned_threads(&self) -> u64 {
        self.abandoned_threads.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> GuardStats {
        GuardStats {
            calls: self.calls.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            hangs: self.hangs.load(Ordering::Relaxed),
            process_timeouts: self.process_timeouts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            abandoned_threads: self.abandoned_threads.load(Ordering::Acquire),
        }
    }
}
