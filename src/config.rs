/*!
 * Configuration
 *
 * Defaults, presets and environment overrides for a `SafeFileSystem`.
 *
 * Environment variables read by [`SafeFsConfig::from_env`]:
 * - SAFEFS_SIZE_TIMEOUT_SECS, SAFEFS_EXISTS_TIMEOUT_SECS, SAFEFS_COPY_TIMEOUT_SECS
 * - SAFEFS_SIZE_RETRIES, SAFEFS_EXISTS_RETRIES, SAFEFS_COPY_RETRIES
 * - SAFEFS_WORKER: worker program path
 */

use crate::core::errors::{SafeFsError, SafeFsResult};
use crate::core::guard::TimeoutSpec;
use crate::core::limits::MAX_RETRIES;
use crate::process::WorkerConfig;
use crate::timeout::{RetryConfig, TimeoutConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Complete configuration of a `SafeFileSystem`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeFsConfig {
    pub timeouts: TimeoutConfig,
    pub retries: RetryConfig,
    pub worker: WorkerConfig,
}

impl SafeFsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short timeouts, default retries
    pub fn aggressive() -> Self {
        Self {
            timeouts: TimeoutConfig::aggressive(),
            ..Self::default()
        }
    }

    /// Long timeouts, no retries
    pub fn relaxed() -> Self {
        Self {
            timeouts: TimeoutConfig::relaxed(),
            retries: RetryConfig::none(),
            ..Self::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_retries(mut self, retries: RetryConfig) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_worker(mut self, worker: WorkerConfig) -> Self {
        self.worker = worker;
        self
    }

    /// Defaults overridden by `SAFEFS_*` environment variables
    pub fn from_env() -> SafeFsResult<Self> {
        let mut config = Self::default();

        if let Some(t) = env_timeout("SAFEFS_SIZE_TIMEOUT_SECS")? {
            config.timeouts.file_size = t;
        }
        if let Some(t) = env_timeout("SAFEFS_EXISTS_TIMEOUT_SECS")? {
            config.timeouts.exists = t;
        }
        if let Some(t) = env_timeout("SAFEFS_COPY_TIMEOUT_SECS")? {
            config.timeouts.copy = t;
        }

        if let Some(n) = env_retries("SAFEFS_SIZE_RETRIES")? {
            config.retries.file_size = n;
        }
        if let Some(n) = env_retries("SAFEFS_EXISTS_RETRIES")? {
            config.retries.exists = n;
        }
        if let Some(n) = env_retries("SAFEFS_COPY_RETRIES")? {
            config.retries.copy = n;
        }

        if let Some(program) = env_var("SAFEFS_WORKER")? {
            config.worker.program = PathBuf::from(program);
        }

        debug!(?config, "configuration loaded from environment");
        Ok(config)
    }
}

fn env_var(key: &str) -> SafeFsResult<Option<String>> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(SafeFsError::Config(format!("{} is not valid unicode", key)))
        }
    }
}

fn env_timeout(key: &str) -> SafeFsResult<Option<TimeoutSpec>> {
    let Some(raw) = env_var(key)? else {
        return Ok(None);
    };
    let secs: i64 = raw
        .parse()
        .map_err(|_| SafeFsError::Config(format!("{}={} is not a whole number of seconds", key, raw)))?;
    TimeoutSpec::from_secs(secs)
        .map(Some)
        .map_err(|e| SafeFsError::Config(format!("{}: {}", key, e)))
}

fn env_retries(key: &str) -> SafeFsResult<Option<u32>> {
    let Some(raw) = env_var(key)? else {
        return Ok(None);
    };
    let retries: u32 = raw
        .parse()
        .map_err(|_| SafeFsError::Config(format!("{}={} is not a retry count", key, raw)))?;
    if retries > MAX_RETRIES {
        return Err(SafeFsError::Config(format!(
            "{}={} exceeds the maximum of {}",
            key, retries, MAX_RETRIES
        )));
    }
    Ok(Some(retries))
}
