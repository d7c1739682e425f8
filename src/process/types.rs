/*!
 * Process Types
 * Worker process configuration
 */

use crate::core::limits::{
    DEFAULT_WORKER_PROGRAM, MAX_WORKER_RESPONSE_BYTES, WATCHDOG_POLL_INTERVAL, WORKER_SUBCOMMAND,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the worker process is launched and watched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Program to spawn
    pub program: PathBuf,
    /// Arguments that put the program into worker mode
    pub args: Vec<String>,
    /// Extra environment for the worker
    pub env_vars: Vec<(String, String)>,
    /// Watchdog polling interval
    pub poll_interval: Duration,
    /// Largest response accepted from the worker
    pub max_response_bytes: usize,
}

impl WorkerConfig {
    /// Worker running `program worker`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![WORKER_SUBCOMMAND.to_string()],
            env_vars: Vec::new(),
            poll_interval: WATCHDOG_POLL_INTERVAL,
            max_response_bytes: MAX_WORKER_RESPONSE_BYTES,
        }
    }

    /// Replace the worker arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// The `safefs` binary next to the running executable, or on `PATH`
    pub fn default_program() -> PathBuf {
        let name = format!("{}{}", DEFAULT_WORKER_PROGRAM, std::env::consts::EXE_SUFFIX);
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
            .filter(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(Self::default_program())
    }
}
