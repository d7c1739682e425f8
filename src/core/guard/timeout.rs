/*!
 * Timeout Specification
 *
 * Validated, strictly positive time budgets for guarded calls.
 *
 * ## Example
 *
 * ```
 * use safe_fs::TimeoutSpec;
 * use std::time::Duration;
 *
 * let spec = TimeoutSpec::from_secs(5).unwrap();
 * assert_eq!(spec.duration(), Duration::from_secs(5));
 *
 * // Zero and negative budgets are configuration errors
 * assert!(TimeoutSpec::from_secs(0).is_err());
 * assert!(TimeoutSpec::from_secs(-1).is_err());
 * ```
 */

use crate::core::errors::{SafeFsError, SafeFsResult};
use crate::core::limits::{DEFAULT_COPY_TIMEOUT, DEFAULT_QUERY_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Strictly positive time budget for one guarded attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Duration", into = "Duration")]
pub struct TimeoutSpec(Duration);

impl TimeoutSpec {
    /// Default budget for size and existence queries: 5s
    pub const fn default_query() -> Self {
        Self(DEFAULT_QUERY_TIMEOUT)
    }

    /// Default budget for copies: 10s
    pub const fn default_copy() -> Self {
        Self(DEFAULT_COPY_TIMEOUT)
    }

    /// Wrap a non-zero constant from `core::limits`
    pub(crate) const fn from_const(duration: Duration) -> Self {
        Self(duration)
    }

    /// Build from a duration, rejecting zero
    pub fn new(duration: Duration) -> SafeFsResult<Self> {
        if duration.is_zero() {
            return Err(SafeFsError::InvalidTimeout(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self(duration))
    }

    /// Build from whole seconds, rejecting zero and negative values
    pub fn from_secs(secs: i64) -> SafeFsResult<Self> {
        if secs <= 0 {
            return Err(SafeFsError::InvalidTimeout(format!(
                "timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        Ok(Self(Duration::from_secs(secs as u64)))
    }

    /// Build from milliseconds, rejecting zero
    pub fn from_millis(millis: u64) -> SafeFsResult<Self> {
        Self::new(Duration::from_millis(millis))
    }

    /// Get the budget as a duration
    #[inline]
    pub fn duration(&self) -> Duration {
        self.0
    }

    #[inline]
    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    /// Whole seconds, rounded up so sub-second budgets never report 0
    pub fn as_secs_ceil(&self) -> u64 {
        let secs = self.0.as_secs();
        if self.0.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Deadline for an attempt started at `start`
    #[inline]
    pub fn deadline_from(&self, start: Instant) -> Instant {
        start + self.0
    }

    /// Check if this budget has expired
    pub fn is_expired(&self, start: Instant) -> bool {
        start.elapsed() >= self.0
    }

    /// Remaining time before expiry, zero once expired
    pub fn remaining(&self, start: Instant) -> Duration {
        self.0.saturating_sub(start.elapsed())
    }
}

impl TryFrom<Duration> for TimeoutSpec {
    type Error = SafeFsError;

    fn try_from(duration: Duration) -> SafeFsResult<Self> {
        Self::new(duration)
    }
}

impl From<TimeoutSpec> for Duration {
    fn from(spec: TimeoutSpec) -> Self {
        spec.0
    }
}

impl fmt::Display for TimeoutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_nanos() == 0 {
            write!(f, "{}s", self.0.as_secs())
        } else {
            write!(f, "{}ms", self.0.as_millis())
        }
    }
}

/// Timing context for a single guarded attempt
#[derive(Debug, Clone)]
pub struct TimeoutContext {
    spec: TimeoutSpec,
    start: Instant,
    operation: &'static str,
}

impl TimeoutContext {
    /// Start the clock for `operation`
    pub fn start(spec: TimeoutSpec, operation: &'static str) -> Self {
        Self {
            spec,
            start: Instant::now(),
            operation,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.spec.deadline_from(self.start)
    }

    pub fn is_expired(&self) -> bool {
        self.spec.is_expired(self.start)
    }

    pub fn remaining(&self) -> Duration {
        self.spec.remaining(self.start)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn spec(&self) -> TimeoutSpec {
        self.spec
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_defaults() {
        assert_eq!(TimeoutSpec::default_query().duration(), Duration::from_secs(5));
        assert_eq!(TimeoutSpec::default_copy().duration(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            TimeoutSpec::from_secs(0),
            Err(SafeFsError::InvalidTimeout(_))
        ));
        assert!(matches!(
            TimeoutSpec::from_secs(-3),
            Err(SafeFsError::InvalidTimeout(_))
        ));
        assert!(TimeoutSpec::new(Duration::ZERO).is_err());
        assert!(TimeoutSpec::from_millis(0).is_err());
    }

    #[test]
    fn test_display_and_rounding() {
        assert_eq!(TimeoutSpec::from_secs(5).unwrap().to_string(), "5s");
        let spec = TimeoutSpec::from_millis(250).unwrap();
        assert_eq!(spec.to_string(), "250ms");
        assert_eq!(spec.as_secs_ceil(), 1);
        assert_eq!(spec.as_millis(), 250);
    }

    #[test]
    fn test_serde_rejects_zero() {
        let json = serde_json::to_string(&TimeoutSpec::from_secs(2).unwrap()).unwrap();
        let back: TimeoutSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.duration(), Duration::from_secs(2));

        let zero = serde_json::to_string(&Duration::ZERO).unwrap();
        assert!(serde_json::from_str::<TimeoutSpec>(&zero).is_err());
    }

    #[test]
    fn test_context_expiration() {
        let ctx = TimeoutContext::start(TimeoutSpec::from_millis(20).unwrap(), "file_size");
        assert!(!ctx.is_expired());
        assert_eq!(ctx.operation(), "file_size");

        thread::sleep(Duration::from_millis(30));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }
}
