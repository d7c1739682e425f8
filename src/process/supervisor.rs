/*!
 * Process Supervisor Interface
 *
 * Hard timeout capability: run an operation in an isolated child process and
 * guarantee that the child is gone once the deadline has passed.
 */

use crate::core::guard::{GuardOutcome, TimeoutSpec};
use crate::fs::ops::{FsOperation, Operation};
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;

/// Process supervision errors, unrelated to the operation's own outcome
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SupervisorError {
    #[error("Failed to spawn worker '{program}': {reason}")]
    #[diagnostic(
        code(supervisor::spawn_failed),
        help("Check that the worker program exists and is executable, or set SAFEFS_WORKER.")
    )]
    Spawn { program: String, reason: String },

    #[error("Worker I/O failed: {0}")]
    #[diagnostic(code(supervisor::io))]
    Io(String),

    #[error("Worker protocol error: {0}")]
    #[diagnostic(
        code(supervisor::protocol),
        help("The worker program may not be a compatible safefs binary.")
    )]
    Protocol(String),

    #[error("Worker exited unexpectedly: {0}")]
    #[diagnostic(code(supervisor::unexpected_exit))]
    UnexpectedExit(String),
}

/// Runs operations in child processes with guaranteed termination
///
/// Implementations must return `GuardOutcome::Timeout` only after the child
/// (and anything it started) has been terminated.
pub trait ProcessSupervisor {
    /// Run `op` in a child process, bounded by `timeout`
    fn submit<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> Result<GuardOutcome<O::Output>, SupervisorError>;
}

impl<S: ProcessSupervisor + ?Sized> ProcessSupervisor for &S {
    fn submit<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> Result<GuardOutcome<O::Output>, SupervisorError> {
        (**self).submit(op, timeout, reference)
    }
}

impl<S: ProcessSupervisor + ?Sized> ProcessSupervisor for Arc<S> {
    fn submit<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> Result<GuardOutcome<O::Output>, SupervisorError> {
        (**self).submit(op, timeout, reference)
    }
}

/// Adapter for collaborators that speak the integer exit-status convention
///
/// The wrapped function receives the wire form of the operation and returns
/// `-3` on timeout, another negative value on failure, or the non-negative
/// payload on success.
pub struct StatusSupervisor<F> {
    run: F,
}

impl<F> StatusSupervisor<F>
where
    F: Fn(&FsOperation, TimeoutSpec, &str) -> Result<i64, SupervisorError>,
{
    pub fn new(run: F) -> Self {
        Self { run }
    }
}

impl<F> ProcessSupervisor for StatusSupervisor<F>
where
    F: Fn(&FsOperation, TimeoutSpec, &str) -> Result<i64, SupervisorError>,
{
    fn submit<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> Result<GuardOutcome<O::Output>, SupervisorError> {
        let status = (self.run)(&op.to_request(), timeout, reference)?;
        GuardOutcome::from_exit_status(status).ok_or_else(|| {
            SupervisorError::Protocol(format!(
                "exit status {} is not a valid {} result",
                status,
                O::NAME
            ))
        })
    }
}
