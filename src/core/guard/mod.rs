/*!
 * Timeout Guards
 *
 * Bounded-time execution of filesystem calls that may hang.
 *
 * ## Guard Strategies
 *
 * - **ThreadTimeoutGuard**: soft timeout. The call runs on a second thread and
 *   the caller waits up to the budget. On expiry the thread is abandoned, not
 *   cancelled.
 * - **ProcessSupervisor** (see `crate::process`): hard timeout. The call runs
 *   in a child process that is killed on expiry.
 *
 * Both report a tri-state [`GuardOutcome`].
 */

mod status;
mod thread;
mod timeout;

pub use status::StatusPayload;
pub use thread::ThreadTimeoutGuard;
pub use timeout::{TimeoutContext, TimeoutSpec};

use crate::core::errors::SafeFsResult;
use crate::core::limits::{FAILURE_EXIT_STATUS, TIMEOUT_EXIT_STATUS};
use crate::fs::types::{FsError, FsResult};
use serde::{Deserialize, Serialize};

/// Soft timeout capability: bounded wait, no cancellation
///
/// Implementations return within the budget but may leave the computation
/// running. Hard cancellation lives behind `crate::process::ProcessSupervisor`.
pub trait SoftTimeout {
    fn execute<T, F>(
        &self,
        operation: &'static str,
        op: F,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> SafeFsResult<T>
    where
        F: FnOnce() -> FsResult<T> + Send + 'static,
        T: Send + 'static;
}

/// Tri-state result of one guarded attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuardOutcome<T> {
    /// The computation finished in time
    Success(T),
    /// The computation finished in time but failed
    Failure(FailureCause),
    /// The deadline elapsed first
    Timeout,
}

impl<T> GuardOutcome<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Short label for structured logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
            Self::Timeout => "timeout",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> GuardOutcome<U> {
        match self {
            Self::Success(value) => GuardOutcome::Success(f(value)),
            Self::Failure(cause) => GuardOutcome::Failure(cause),
            Self::Timeout => GuardOutcome::Timeout,
        }
    }
}

impl<T: StatusPayload> GuardOutcome<T> {
    /// Decode the integer exit-status convention
    ///
    /// `-3` is a timeout, any other negative value a failure, and a
    /// non-negative value the success payload. Returns `None` when a
    /// non-negative status is not a valid payload for `T`.
    pub fn from_exit_status(status: i64) -> Option<Self> {
        match status {
            TIMEOUT_EXIT_STATUS => Some(Self::Timeout),
            s if s < 0 => Some(Self::Failure(FailureCause::Status(s))),
            s => T::from_status(s).map(Self::Success),
        }
    }

    /// Encode into the integer exit-status convention
    pub fn exit_status(&self) -> i64 {
        match self {
            Self::Success(value) => value.to_status(),
            Self::Failure(FailureCause::Status(s)) if *s < 0 && *s != TIMEOUT_EXIT_STATUS => *s,
            Self::Failure(_) => FAILURE_EXIT_STATUS,
            Self::Timeout => TIMEOUT_EXIT_STATUS,
        }
    }
}

/// Why a guarded computation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum FailureCause {
    /// The wrapped filesystem primitive returned an error
    #[error(transparent)]
    Operation(#[from] FsError),

    /// The wrapped computation panicked
    #[error("guarded operation panicked: {0}")]
    Panicked(String),

    /// The guard could not start its execution unit
    #[error("failed to start guard: {0}")]
    Spawn(String),

    /// A collaborator reported a bare negative exit status
    #[error("guarded operation failed with exit status {0}")]
    Status(i64),
}
