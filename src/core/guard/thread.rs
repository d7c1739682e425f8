/*!
 * Thread Timeout Guard
 *
 * Soft timeout: the operation runs on a dedicated thread while the caller
 * waits on a one-shot channel for at most the timeout budget.
 *
 * A blocked filesystem call cannot be interrupted from inside the process,
 * so on expiry the thread is NOT cancelled. It is detached and keeps running
 * until the call returns on its own, at which point its result is dropped.
 * Every hang therefore leaks one thread for as long as the mount stays stuck.
 * [`GuardMetrics::abandoned_threads`] reports how many are still alive.
 *
 * Use the process supervisor when the leak is unacceptable.
 */

use super::{FailureCause, SoftTimeout, TimeoutContext, TimeoutSpec};
use crate::core::errors::{reference_suffix, SafeFsError, SafeFsResult};
use crate::core::limits::GUARD_THREAD_NAME;
use crate::fs::types::FsResult;
use crate::monitoring::GuardMetrics;
use flume::RecvTimeoutError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Guard thread lifecycle, shared between caller and guard thread
const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const ABANDONED: u8 = 2;

type ThreadResult<T> = Result<FsResult<T>, String>;

/// Runs operations on a second thread with a bounded wait
#[derive(Debug, Clone, Default)]
pub struct ThreadTimeoutGuard {
    metrics: Option<Arc<GuardMetrics>>,
}

impl ThreadTimeoutGuard {
    pub fn new() -> Self {
        Self { metrics: None }
    }

    /// Report outcomes and abandoned threads to `metrics`
    pub fn with_metrics(metrics: Arc<GuardMetrics>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }
}

impl SoftTimeout for ThreadTimeoutGuard {
    /// Execute `op` on a new thread, waiting at most `timeout`
    ///
    /// # Returns
    ///
    /// - `Ok(T)` if the operation finished in time
    /// - `Err(SafeFsError::Fs(_))` with the operation's own error, unchanged
    /// - `Err(SafeFsError::HangDetected { .. })` if the budget elapsed first
    /// - `Err(SafeFsError::GuardFailure { .. })` if the operation panicked or
    ///   the thread could not be spawned
    fn execute<T, F>(
        &self,
        operation: &'static str,
        op: F,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> SafeFsResult<T>
    where
        F: FnOnce() -> FsResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let ctx = TimeoutContext::start(timeout, operation);
        let (tx, rx) = flume::bounded::<ThreadResult<T>>(1);
        let state = Arc::new(AtomicU8::new(RUNNING));

        let thread_state = Arc::clone(&state);
        let thread_metrics = self.metrics.clone();
        let span = tracing::Span::current();

        let spawned = thread::Builder::new()
            .name(GUARD_THREAD_NAME.to_string())
            .spawn(move || {
                let _entered = span.enter();
                let result = panic::catch_unwind(AssertUnwindSafe(op)).map_err(panic_message);

                // Fails silently once the caller has stopped listening
                let _ = tx.send(result);

                if thread_state
                    .compare_exchange(RUNNING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    if let Some(metrics) = thread_metrics {
                        metrics.abandoned_thread_finished();
                    }
                    debug!(operation, "abandoned guard thread finished, result discarded");
                }
            });

        // The JoinHandle is dropped here: the guard thread is never joined
        if let Err(e) = spawned {
            return Err(self.spawn_failure(operation, e, reference));
        }

        match rx.recv_timeout(timeout.duration()) {
            Ok(result) => self.complete(operation, result, reference),
            Err(RecvTimeoutError::Timeout) => {
                if let Some(metrics) = &self.metrics {
                    metrics.thread_abandoned();
                }
                if state
                    .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return Err(self.hang_detected(&ctx, reference));
                }

                // The thread finished right at the deadline
                if let Some(metrics) = &self.metrics {
                    metrics.abandoned_thread_finished();
                }
                match rx.try_recv() {
                    Ok(result) => self.complete(operation, result, reference),
                    Err(_) => Err(self.lost_result(operation, reference)),
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(self.lost_result(operation, reference)),
        }
    }
}

impl ThreadTimeoutGuard {
    fn complete<T>(
        &self,
        operation: &'static str,
        result: ThreadResult<T>,
        reference: &str,
    ) -> SafeFsResult<T> {
        match result {
            Ok(Ok(value)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_success();
                }
                Ok(value)
            }
            Ok(Err(e)) => {
                error!(
                    operation,
                    reference,
                    error = %e,
                    "filesystem exception inside thread guard"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure();
                }
                Err(SafeFsError::Fs(e))
            }
            Err(panic) => {
                error!(
                    operation,
                    reference,
                    panic = %panic,
                    "guarded operation panicked"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure();
                }
                Err(SafeFsError::GuardFailure {
                    message: format!(
                        "{} panicked inside thread guard{}",
                        operation,
                        reference_suffix(reference)
                    ),
                    reference: reference.to_string(),
                    cause: FailureCause::Panicked(panic),
                })
            }
        }
    }

    /// Timeout path - rare, kept out of line
    #[cold]
    #[inline(never)]
    fn hang_detected(&self, ctx: &TimeoutContext, reference: &str) -> SafeFsError {
        let message = format!(
            "{} timed out after {}, guard thread remaining hanged{}",
            ctx.operation(),
            ctx.spec(),
            reference_suffix(reference)
        );
        error!(
            operation = ctx.operation(),
            reference,
            timeout_ms = ctx.spec().as_millis(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            "thread guard timeout, worker thread abandoned"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_hang();
        }
        SafeFsError::HangDetected {
            message,
            reference: reference.to_string(),
        }
    }

    #[cold]
    fn spawn_failure(
        &self,
        operation: &'static str,
        err: std::io::Error,
        reference: &str,
    ) -> SafeFsError {
        error!(operation, reference, error = %err, "failed to spawn guard thread");
        if let Some(metrics) = &self.metrics {
            metrics.record_failure();
        }
        SafeFsError::GuardFailure {
            message: format!(
                "could not spawn guard thread for {}{}",
                operation,
                reference_suffix(reference)
            ),
            reference: reference.to_string(),
            cause: FailureCause::Spawn(err.to_string()),
        }
    }

    #[cold]
    fn lost_result(&self, operation: &'static str, reference: &str) -> SafeFsError {
        error!(operation, reference, "guard thread exited without a result");
        if let Some(metrics) = &self.metrics {
            metrics.record_failure();
        }
        SafeFsError::GuardFailure {
            message: format!(
                "guard thread for {} exited without a result{}",
                operation,
                reference_suffix(reference)
            ),
            reference: reference.to_string(),
            cause: FailureCause::Panicked("result channel closed".to_string()),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
