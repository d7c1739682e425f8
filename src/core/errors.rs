/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use crate::core::guard::FailureCause;
use miette::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use crate::fs::types::FsError;
pub use crate::process::SupervisorError;

/// Result type for guarded filesystem calls
pub type SafeFsResult<T> = Result<T, SafeFsError>;

/// Unified error type for guarded filesystem calls
///
/// A caller observes exactly one of: a value, a hang, an exhausted retry
/// budget, a guard failure, or one of the pass-through errors below.
#[derive(Error, Debug, Diagnostic)]
pub enum SafeFsError {
    /// Thread-guarded call exceeded its bound; the worker thread was abandoned
    #[error("{message}")]
    #[diagnostic(
        code(safefs::hang_detected),
        help("The mount may be unresponsive. The guard thread is still running in the background.")
    )]
    HangDetected { message: String, reference: String },

    /// Every permitted process-guarded attempt timed out
    #[error("{message}")]
    #[diagnostic(
        code(safefs::retry_exhausted),
        help("All attempts timed out. Check the health of the mount holding this path.")
    )]
    RetryExhausted {
        message: String,
        path: PathBuf,
        timeout: Duration,
        attempts: u32,
    },

    /// The guarded computation itself failed
    #[error("{message}")]
    #[diagnostic(code(safefs::guard_failure))]
    GuardFailure {
        message: String,
        reference: String,
        #[source]
        cause: FailureCause,
    },

    /// Underlying primitive error, propagated unchanged by thread-guarded calls
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] FsError),

    /// Process supervision failed for a reason unrelated to the deadline
    #[error(transparent)]
    #[diagnostic(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Invalid timeout: {0}")]
    #[diagnostic(
        code(safefs::invalid_timeout),
        help("Timeouts must be strictly positive.")
    )]
    InvalidTimeout(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(safefs::config_error),
        help("Check the SAFEFS_* environment variables.")
    )]
    Config(String),
}

impl SafeFsError {
    /// True for the two deadline-driven outcomes
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HangDetected { .. } | Self::RetryExhausted { .. })
    }

    /// The underlying filesystem error, whichever guard reported it
    pub fn fs_error(&self) -> Option<&FsError> {
        match self {
            Self::Fs(e) => Some(e),
            Self::GuardFailure {
                cause: FailureCause::Operation(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    /// Correlation reference carried by this error, if any
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::HangDetected { reference, .. } | Self::GuardFailure { reference, .. } => {
                Some(reference)
            }
            _ => None,
        }
    }
}

/// Format a log reference as a message suffix, empty when unset
pub(crate) fn reference_suffix(reference: &str) -> String {
    if reference.is_empty() {
        String::new()
    } else {
        format!(", reference: {}", reference)
    }
}
