/*!
 * Safe Filesystem Facade
 *
 * Size, existence and copy, each in two flavours:
 *
 * - `*_thread`: soft timeout through [`ThreadTimeoutGuard`]. Cheap, but a hang
 *   leaves a thread behind. Primitive errors come back unchanged as
 *   `SafeFsError::Fs`.
 * - `*_process`: hard timeout through a [`ProcessSupervisor`], with the
 *   operation's retry budget from [`RetryConfig`](crate::timeout::RetryConfig).
 *   Primitive errors come back as `SafeFsError::GuardFailure`.
 *
 * Passing `None` as the timeout selects the configured default for the
 * operation. The `reference` string only tags log records and errors.
 */

use super::ops::{CopyTree, ExistsCheck, Operation, SizeQuery};
use super::types::CopyOptions;
use crate::config::SafeFsConfig;
use crate::core::errors::SafeFsResult;
use crate::core::guard::{SoftTimeout, ThreadTimeoutGuard, TimeoutSpec};
use crate::monitoring::{span_operation, GuardMetrics, GuardStats};
use crate::process::{ProcessSupervisor, WorkerSupervisor};
use crate::timeout::RetryPolicy;
use std::path::Path;
use std::sync::Arc;

/// Bounded-time filesystem operations
pub struct SafeFileSystem<S = WorkerSupervisor> {
    config: SafeFsConfig,
    thread_guard: ThreadTimeoutGuard,
    supervisor: S,
    metrics: Arc<GuardMetrics>,
}

impl SafeFileSystem<WorkerSupervisor> {
    /// Default timeouts and retries, `safefs worker` as the worker process
    pub fn new() -> Self {
        Self::with_config(SafeFsConfig::default())
    }

    pub fn with_config(config: SafeFsConfig) -> Self {
        let metrics = Arc::new(GuardMetrics::new());
        let supervisor =
            WorkerSupervisor::new(config.worker.clone()).with_metrics(Arc::clone(&metrics));
        Self {
            thread_guard: ThreadTimeoutGuard::with_metrics(Arc::clone(&metrics)),
            config,
            supervisor,
            metrics,
        }
    }
}

impl Default for SafeFileSystem<WorkerSupervisor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ProcessSupervisor> SafeFileSystem<S> {
    /// Use `supervisor` for the process-guarded variants
    pub fn with_supervisor(config: SafeFsConfig, supervisor: S) -> Self {
        let metrics = Arc::new(GuardMetrics::new());
        Self {
            thread_guard: ThreadTimeoutGuard::with_metrics(Arc::clone(&metrics)),
            config,
            supervisor,
            metrics,
        }
    }

    pub fn config(&self) -> &SafeFsConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    pub fn metrics(&self) -> &Arc<GuardMetrics> {
        &self.metrics
    }

    pub fn stats(&self) -> GuardStats {
        self.metrics.snapshot()
    }

    // =========================================================================
    // Size
    // =========================================================================

    /// Size of a regular file in bytes, thread-guarded
    pub fn file_size_thread(
        &self,
        path: impl AsRef<Path>,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<u64> {
        let timeout = timeout.unwrap_or(self.config.timeouts.file_size);
        self.run_thread(SizeQuery::new(path.as_ref()), timeout, reference)
    }

    /// Size of a regular file in bytes, process-guarded with retries
    pub fn file_size_process(
        &self,
        path: impl AsRef<Path>,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<u64> {
        let timeout = timeout.unwrap_or(self.config.timeouts.file_size);
        let policy = RetryPolicy::new(self.config.retries.file_size);
        self.run_process(&SizeQuery::new(path.as_ref()), timeout, policy, reference)
    }

    // =========================================================================
    // Exists
    // =========================================================================

    /// Whether `path` exists, thread-guarded
    pub fn exists_thread(
        &self,
        path: impl AsRef<Path>,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<bool> {
        let timeout = timeout.unwrap_or(self.config.timeouts.exists);
        self.run_thread(ExistsCheck::new(path.as_ref()), timeout, reference)
    }

    /// Whether `path` exists, process-guarded
    pub fn exists_process(
        &self,
        path: impl AsRef<Path>,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<bool> {
        let timeout = timeout.unwrap_or(self.config.timeouts.exists);
        let policy = RetryPolicy::new(self.config.retries.exists);
        self.run_process(&ExistsCheck::new(path.as_ref()), timeout, policy, reference)
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Copy a file or directory tree, thread-guarded
    pub fn copy_thread(
        &self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        options: CopyOptions,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<()> {
        let timeout = timeout.unwrap_or(self.config.timeouts.copy);
        let op = CopyTree::new(src.as_ref(), dst.as_ref(), options);
        self.run_thread(op, timeout, reference)
    }

    /// Copy a file or directory tree, process-guarded
    pub fn copy_process(
        &self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        options: CopyOptions,
        timeout: Option<TimeoutSpec>,
        reference: &str,
    ) -> SafeFsResult<()> {
        let timeout = timeout.unwrap_or(self.config.timeouts.copy);
        let policy = RetryPolicy::new(self.config.retries.copy);
        let op = CopyTree::new(src.as_ref(), dst.as_ref(), options);
        self.run_process(&op, timeout, policy, reference)
    }

    fn run_thread<O: Operation>(
        &self,
        op: O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> SafeFsResult<O::Output> {
        let span = span_operation(O::NAME, "thread", reference);
        let _entered = span.enter();
        self.metrics.record_call();

        let result = self
            .thread_guard
            .execute(O::NAME, move || op.run(), timeout, reference);
        span.record_result(result.is_ok());
        result
    }

    fn run_process<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        policy: RetryPolicy,
        reference: &str,
    ) -> SafeFsResult<O::Output> {
        let span = span_operation(O::NAME, "process", reference);
        let _entered = span.enter();
        self.metrics.record_call();

        let result = policy.execute(
            &self.supervisor,
            op,
            timeout,
            reference,
            Some(&self.metrics),
        );
        span.record_result(result.is_ok());
        result
    }
}
