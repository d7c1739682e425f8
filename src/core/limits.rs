/*!
 * System Limits and Constants
 *
 * Centralized location for default timeouts, retry budgets and protocol limits.
 */

use std::time::Duration;

// =============================================================================
// TIMEOUTS
// =============================================================================

/// Default bound for size and existence queries (5s)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound for copies (10s)
pub const DEFAULT_COPY_TIMEOUT: Duration = Duration::from_secs(10);

/// Aggressive preset bound for queries (1s)
pub const AGGRESSIVE_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

/// Aggressive preset bound for copies (3s)
pub const AGGRESSIVE_COPY_TIMEOUT: Duration = Duration::from_secs(3);

/// Relaxed preset bound for queries on slow mounts (30s)
pub const RELAXED_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Relaxed preset bound for copies on slow mounts (120s)
pub const RELAXED_COPY_TIMEOUT: Duration = Duration::from_secs(120);

// =============================================================================
// RETRY BUDGETS
// =============================================================================

/// Retries for process-guarded size queries (3 attempts total)
pub const DEFAULT_SIZE_RETRIES: u32 = 2;

/// Retries for process-guarded existence checks
pub const DEFAULT_EXISTS_RETRIES: u32 = 0;

/// Retries for process-guarded copies
pub const DEFAULT_COPY_RETRIES: u32 = 0;

/// Upper bound accepted from configuration
pub const MAX_RETRIES: u32 = 16;

// =============================================================================
// EXIT-STATUS CONVENTION
// =============================================================================

/// Exit status meaning the supervised child was killed on deadline
pub const TIMEOUT_EXIT_STATUS: i64 = -3;

/// Exit status used for a generic guarded failure
pub const FAILURE_EXIT_STATUS: i64 = -1;

// =============================================================================
// PROCESS SUPERVISION
// =============================================================================

/// Watchdog polling interval while waiting on a worker (10ms)
pub const WATCHDOG_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Largest response accepted from a worker (1MB)
pub const MAX_WORKER_RESPONSE_BYTES: usize = 1024 * 1024;

/// Largest request accepted by a worker (1MB)
pub const MAX_WORKER_REQUEST_BYTES: usize = 1024 * 1024;

/// Program name of the shipped worker binary
pub const DEFAULT_WORKER_PROGRAM: &str = "safefs";

/// Subcommand that switches the binary into worker mode
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Exit code of a worker that could not speak the protocol
pub const WORKER_PROTOCOL_EXIT_CODE: i32 = 2;

/// How long a killed worker may take to be reaped before a reaper thread takes over (250ms)
pub const KILL_REAP_GRACE: Duration = Duration::from_millis(250);

/// Name given to request writer, response reader and reaper threads
pub const WORKER_IO_THREAD_NAME: &str = "safefs-worker-io";

// =============================================================================
// THREAD GUARD
// =============================================================================

/// Name given to guard threads
pub const GUARD_THREAD_NAME: &str = "safefs-guard";

/// Calls slower than this are logged at warn level (1s)
pub const SLOW_CALL_THRESHOLD: Duration = Duration::from_secs(1);
