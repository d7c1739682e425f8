/*!
 * Timeout Configuration
 * Per-operation timeout and retry budgets
 */

use crate::core::guard::TimeoutSpec;
use crate::core::limits::{
    AGGRESSIVE_COPY_TIMEOUT, AGGRESSIVE_QUERY_TIMEOUT, DEFAULT_COPY_RETRIES, DEFAULT_COPY_TIMEOUT,
    DEFAULT_EXISTS_RETRIES, DEFAULT_QUERY_TIMEOUT, DEFAULT_SIZE_RETRIES, MAX_RETRIES,
    RELAXED_COPY_TIMEOUT, RELAXED_QUERY_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for each operation when the caller passes none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub file_size: TimeoutSpec,
    pub exists: TimeoutSpec,
    pub copy: TimeoutSpec,
}

impl TimeoutConfig {
    /// 5s for queries, 10s for copies
    pub fn new() -> Self {
        Self::uniform(DEFAULT_QUERY_TIMEOUT, DEFAULT_COPY_TIMEOUT)
    }

    /// Fail fast on mounts expected to be healthy
    pub fn aggressive() -> Self {
        Self::uniform(AGGRESSIVE_QUERY_TIMEOUT, AGGRESSIVE_COPY_TIMEOUT)
    }

    /// Tolerate slow but working mounts
    pub fn relaxed() -> Self {
        Self::uniform(RELAXED_QUERY_TIMEOUT, RELAXED_COPY_TIMEOUT)
    }

    fn uniform(query: Duration, copy: Duration) -> Self {
        Self {
            file_size: TimeoutSpec::from_const(query),
            exists: TimeoutSpec::from_const(query),
            copy: TimeoutSpec::from_const(copy),
        }
    }

    pub fn with_file_size(mut self, timeout: TimeoutSpec) -> Self {
        self.file_size = timeout;
        self
    }

    pub fn with_exists(mut self, timeout: TimeoutSpec) -> Self {
        self.exists = timeout;
        self
    }

    pub fn with_copy(mut self, timeout: TimeoutSpec) -> Self {
        self.copy = timeout;
        self
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Retries after a timed-out first attempt, process-guarded calls only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub file_size: u32,
    pub exists: u32,
    pub copy: u32,
}

impl RetryConfig {
    /// Size queries retry twice; existence checks and copies run once
    pub const fn new() -> Self {
        Self {
            file_size: DEFAULT_SIZE_RETRIES,
            exists: DEFAULT_EXISTS_RETRIES,
            copy: DEFAULT_COPY_RETRIES,
        }
    }

    /// Every call makes a single attempt
    pub const fn none() -> Self {
        Self {
            file_size: 0,
            exists: 0,
            copy: 0,
        }
    }

    /// Same budget for every operation, capped at [`MAX_RETRIES`]
    pub fn uniform(retries: u32) -> Self {
        let retries = retries.min(MAX_RETRIES);
        Self {
            file_size: retries,
            exists: retries,
            copy: retries,
        }
    }

    pub fn with_file_size(mut self, retries: u32) -> Self {
        self.file_size = retries.min(MAX_RETRIES);
        self
    }

    pub fn with_exists(mut self, retries: u32) -> Self {
        self.exists = retries.min(MAX_RETRIES);
        self
    }

    pub fn with_copy(mut self, retries: u32) -> Self {
        self.copy = retries.min(MAX_RETRIES);
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}
