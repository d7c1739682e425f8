/*!
 * Retry on Timeout
 *
 * Bounded retry loop around process-guarded calls.
 *
 * ```text
 * Attempting(n) --Timeout, n < max--> Attempting(n + 1)
 * Attempting(n) --Timeout, n = max--> ExhaustedRetries   => RetryExhausted
 * Attempting(n) --Failure-----------> ExhaustedRetries   => GuardFailure
 * Attempting(n) --Success-----------> Succeeded          => value
 * ```
 *
 * Only timeouts are retried. A failing primitive (missing path, permission
 * denied) or a broken supervisor ends the call on the first attempt, so a
 * genuinely absent path is never hidden behind retries. Attempts run one
 * after another on the calling thread; each is a fresh submission.
 */

use crate::core::errors::{reference_suffix, SafeFsError, SafeFsResult};
use crate::core::guard::{GuardOutcome, TimeoutSpec};
use crate::fs::ops::Operation;
use crate::monitoring::GuardMetrics;
use crate::process::ProcessSupervisor;
use tracing::{error, info, warn};

/// Progress of one retried call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `attempt` (zero-based) is about to run
    Attempting { attempt: u32 },
    /// An attempt returned a value
    Succeeded { attempts: u32 },
    /// The call ended without a value
    ExhaustedRetries { attempts: u32 },
}

impl RetryState {
    /// Attempts made so far, including a running one
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Attempting { attempt } => attempt + 1,
            Self::Succeeded { attempts } | Self::ExhaustedRetries { attempts } => attempts,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Attempting { .. })
    }
}

/// Number of retries allowed after a timed-out first attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// A single attempt
    pub const fn none() -> Self {
        Self { max_retries: 0 }
    }

    #[inline]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts, first one included
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Next state after an attempt in `state` produced `outcome`
    pub fn advance<T>(&self, state: RetryState, outcome: &GuardOutcome<T>) -> RetryState {
        let attempt = match state {
            RetryState::Attempting { attempt } => attempt,
            terminal => return terminal,
        };
        match outcome {
            GuardOutcome::Success(_) => RetryState::Succeeded {
                attempts: attempt + 1,
            },
            GuardOutcome::Timeout if attempt < self.max_retries => RetryState::Attempting {
                attempt: attempt + 1,
            },
            GuardOutcome::Timeout | GuardOutcome::Failure(_) => RetryState::ExhaustedRetries {
                attempts: attempt + 1,
            },
        }
    }

    /// Submit `op` to `supervisor`, retrying timed-out attempts
    ///
    /// # Returns
    ///
    /// - `Ok(value)` from the first successful attempt
    /// - `Err(SafeFsError::RetryExhausted { .. })` once every attempt timed out
    /// - `Err(SafeFsError::GuardFailure { .. })` if the operation failed
    /// - `Err(SafeFsError::Supervisor(_))` if supervision itself failed
    pub fn execute<S, O>(
        &self,
        supervisor: &S,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
        metrics: Option<&GuardMetrics>,
    ) -> SafeFsResult<O::Output>
    where
        S: ProcessSupervisor + ?Sized,
        O: Operation,
    {
        let path = op.path().display().to_string();
        let mut state = RetryState::Attempting { attempt: 0 };

        loop {
            let attempt = match state {
                RetryState::Attempting { attempt } => attempt,
                _ => unreachable!("terminal retry states return before looping"),
            };

            info!(
                operation = O::NAME,
                path = %path,
                timeout_ms = timeout.as_millis(),
                attempt,
                max_retries = self.max_retries,
                reference,
                "process-guarded attempt"
            );

            let outcome = match supervisor.submit(op, timeout, reference) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        operation = O::NAME,
                        path = %path,
                        attempt,
                        reference,
                        error = %e,
                        "process supervisor failed"
                    );
                    if let Some(metrics) = metrics {
                        metrics.record_failure();
                    }
                    return Err(SafeFsError::Supervisor(e));
                }
            };

            if outcome.is_timeout() {
                if let Some(metrics) = metrics {
                    metrics.record_process_timeout();
                }
            }

            state = self.advance(state, &outcome);
            match (state, outcome) {
                (RetryState::Succeeded { .. }, GuardOutcome::Success(value)) => {
                    if let Some(metrics) = metrics {
                        metrics.record_success();
                    }
                    return Ok(value);
                }
                (RetryState::Attempting { attempt: next }, _) => {
                    warn!(
                        operation = O::NAME,
                        path = %path,
                        timeout_ms = timeout.as_millis(),
                        attempt = next,
                        max_retries = self.max_retries,
                        reference,
                        "attempt timed out, retrying"
                    );
                    if let Some(metrics) = metrics {
                        metrics.record_retry();
                    }
                }
                (RetryState::ExhaustedRetries { attempts }, GuardOutcome::Failure(cause)) => {
                    let message = format!(
                        "{} failed, path: {}{}",
                        O::NAME,
                        path,
                        reference_suffix(reference)
                    );
                    error!(
                        operation = O::NAME,
                        path = %path,
                        attempts,
                        reference,
                        cause = %cause,
                        "process-guarded operation failed"
                    );
                    if let Some(metrics) = metrics {
                        metrics.record_failure();
                    }
                    return Err(SafeFsError::GuardFailure {
                        message,
                        reference: reference.to_string(),
                        cause,
                    });
                }
                (RetryState::ExhaustedRetries { attempts }, _) => {
                    let tries = if attempts == 1 {
                        "after 1 attempt".to_string()
                    } else {
                        format!("on all {} attempts", attempts)
                    };
                    let message = format!(
                        "{} timed out {}, path: {}, timeout: {}{}",
                        O::NAME,
                        tries,
                        path,
                        timeout,
                        reference_suffix(reference)
                    );
                    error!(
                        operation = O::NAME,
                        path = %path,
                        timeout_ms = timeout.as_millis(),
                        attempts,
                        max_retries = self.max_retries,
                        reference,
                        "retries exhausted"
                    );
                    if let Some(metrics) = metrics {
                        metrics.record_exhausted();
                    }
                    return Err(SafeFsError::RetryExhausted {
                        message,
                        path: op.path().to_path_buf(),
                        timeout: timeout.duration(),
                        attempts,
                    });
                }
                (RetryState::Succeeded { .. }, _) => {
                    unreachable!("only a successful outcome leads to Succeeded")
                }
            }
        }
    }
}
