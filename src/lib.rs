/*!
 * Safe FS Library
 * Bounded-time filesystem access for mounts that may hang
 *
 * ```no_run
 * use safe_fs::{SafeFileSystem, TimeoutSpec};
 *
 * let safe = SafeFileSystem::new();
 * let size = safe.file_size_process("/mnt/nas/archive.tar", None, "nightly-backup")?;
 * let present = safe.exists_thread("/mnt/nas/archive.tar", TimeoutSpec::from_secs(2).ok(), "")?;
 * # Ok::<(), safe_fs::SafeFsError>(())
 * ```
 */

pub mod config;
pub mod core;
pub mod fs;
pub mod monitoring;
pub mod process;
pub mod timeout;

// Re-exports
pub use config::SafeFsConfig;
pub use crate::core::errors::{FsError, SafeFsError, SafeFsResult, SupervisorError};
pub use crate::core::guard::{FailureCause, GuardOutcome, SoftTimeout, ThreadTimeoutGuard, TimeoutSpec};
pub use fs::{CopyOptions, ExistingPolicy, SafeFileSystem, SymlinkPolicy};
pub use monitoring::{init_tracing, GuardMetrics, GuardStats};
pub use process::{ProcessSupervisor, WorkerConfig, WorkerSupervisor};
pub use timeout::{RetryConfig, RetryPolicy, TimeoutConfig};
