/*!
 * Worker Process Supervisor
 *
 * Default [`ProcessSupervisor`]: one short-lived worker process per attempt.
 *
 * ## Lifecycle
 *
 * 1. Spawn the worker in its own process group with piped stdin/stdout
 * 2. Write the request on a writer thread, then close stdin
 * 3. Drain stdout on a reader thread so a large response never stalls the child
 * 4. Poll `try_wait` until exit or deadline
 * 5. On deadline: `SIGKILL` the whole group, reap the child, report `Timeout`
 *
 * Nothing on the calling thread blocks on the worker outside the watchdog.
 * A worker stuck in an uninterruptible filesystem call only dies once the call
 * returns to user space, so reaping after the kill is bounded by
 * [`KILL_REAP_GRACE`]. Past that the child goes to a reaper thread and the
 * attempt still reports `Timeout`.
 */

use super::supervisor::{ProcessSupervisor, SupervisorError};
use super::types::WorkerConfig;
use crate::core::guard::{FailureCause, GuardOutcome, TimeoutContext, TimeoutSpec};
use crate::core::limits::{KILL_REAP_GRACE, MAX_WORKER_REQUEST_BYTES, WORKER_IO_THREAD_NAME};
use crate::fs::ops::Operation;
use crate::fs::types::FsError;
use crate::monitoring::GuardMetrics;
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Spawns one worker process per attempt and kills it on deadline
#[derive(Debug, Clone, Default)]
pub struct WorkerSupervisor {
    config: WorkerConfig,
    metrics: Option<Arc<GuardMetrics>>,
}

impl WorkerSupervisor {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Count kills in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<GuardMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn spawn(&self) -> Result<Child, SupervisorError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        for (key, value) in &self.config.env_vars {
            cmd.env(key, value);
        }

        // Own process group so a deadline kill reaches everything the worker started
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd.spawn().map_err(|e| SupervisorError::Spawn {
            program: self.config.program.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Wait for exit or deadline; `None` means the deadline won
    fn watch(
        &self,
        child: &mut Child,
        ctx: &TimeoutContext,
    ) -> Result<Option<ExitStatus>, SupervisorError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {
                    if ctx.is_expired() {
                        return Ok(None);
                    }
                    thread::sleep(self.config.poll_interval.min(ctx.remaining()));
                }
                Err(e) => return Err(SupervisorError::Io(format!("waiting on worker: {}", e))),
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn terminate(&self, mut child: Child, ctx: &TimeoutContext, reference: &str) {
        let pid = child.id();
        kill_group(&mut child);
        let reaped = reap_bounded(child, KILL_REAP_GRACE, self.config.poll_interval);
        if let Some(metrics) = &self.metrics {
            metrics.record_kill();
        }
        error!(
            operation = ctx.operation(),
            reference,
            pid,
            reaped,
            timeout_ms = ctx.spec().as_millis(),
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            "worker timed out, process group killed"
        );
    }

    /// Kill and reap a worker the attempt can no longer use, passing `err` through
    #[cold]
    fn abort(&self, mut child: Child, err: SupervisorError) -> SupervisorError {
        kill_group(&mut child);
        reap_bounded(child, KILL_REAP_GRACE, self.config.poll_interval);
        err
    }
}

impl ProcessSupervisor for WorkerSupervisor {
    fn submit<O: Operation>(
        &self,
        op: &O,
        timeout: TimeoutSpec,
        reference: &str,
    ) -> Result<GuardOutcome<O::Output>, SupervisorError> {
        let request = bincode::serialize(&op.to_request())
            .map_err(|e| SupervisorError::Protocol(format!("encoding request: {}", e)))?;
        if request.len() > MAX_WORKER_REQUEST_BYTES {
            return Err(SupervisorError::Protocol(format!(
                "request of {} bytes exceeds {} bytes",
                request.len(),
                MAX_WORKER_REQUEST_BYTES
            )));
        }

        let ctx = TimeoutContext::start(timeout, O::NAME);
        let mut child = self.spawn()?;
        let pid = child.id();
        debug!(operation = O::NAME, reference, pid, "worker spawned");

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                return Err(self.abort(
                    child,
                    SupervisorError::Io("worker stdio not captured".to_string()),
                ))
            }
        };

        // The writer is never joined; it ends once the worker reads or dies
        if let Err(e) = write_request_async(stdin, request, pid) {
            return Err(self.abort(child, e));
        }
        let reader = match read_response_async(stdout, self.config.max_response_bytes) {
            Ok(reader) => reader,
            Err(e) => return Err(self.abort(child, e)),
        };

        let status = match self.watch(&mut child, &ctx) {
            Ok(Some(status)) => status,
            Ok(None) => {
                self.terminate(child, &ctx, reference);
                // The reader sees EOF once the group is dead; it is not joined here
                return Ok(GuardOutcome::Timeout);
            }
            Err(e) => return Err(self.abort(child, e)),
        };

        let response = reader
            .join()
            .map_err(|_| SupervisorError::Io("response reader panicked".to_string()))??;

        if !status.success() {
            return Err(SupervisorError::UnexpectedExit(status.to_string()));
        }

        let decoded: Result<O::Output, FsError> = bincode::deserialize(&response)
            .map_err(|e| SupervisorError::Protocol(format!("decoding response: {}", e)))?;

        info!(
            operation = O::NAME,
            reference,
            pid,
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            ok = decoded.is_ok(),
            "worker finished"
        );

        Ok(match decoded {
            Ok(value) => GuardOutcome::Success(value),
            Err(e) => GuardOutcome::Failure(FailureCause::Operation(e)),
        })
    }
}

fn write_request_async(
    mut stdin: ChildStdin,
    request: Vec<u8>,
    pid: u32,
) -> Result<(), SupervisorError> {
    thread::Builder::new()
        .name(WORKER_IO_THREAD_NAME.to_string())
        .spawn(move || {
            // A worker that exits early shows up in its exit status instead
            if let Err(e) = stdin.write_all(&request) {
                debug!(pid, error = %e, "could not write request to worker");
            }
        })
        .map(|_| ())
        .map_err(|e| SupervisorError::Io(format!("spawning request writer: {}", e)))
}

fn read_response_async(
    stdout: ChildStdout,
    limit: usize,
) -> Result<thread::JoinHandle<Result<Vec<u8>, SupervisorError>>, SupervisorError> {
    thread::Builder::new()
        .name(WORKER_IO_THREAD_NAME.to_string())
        .spawn(move || {
            let mut out = Vec::new();
            stdout
                .take(limit as u64 + 1)
                .read_to_end(&mut out)
                .map_err(|e| SupervisorError::Io(format!("reading response: {}", e)))?;
            if out.len() > limit {
                return Err(SupervisorError::Protocol(format!(
                    "response exceeds {} bytes",
                    limit
                )));
            }
            Ok(out)
        })
        .map_err(|e| SupervisorError::Io(format!("spawning response reader: {}", e)))
}

/// Reap `child` within `grace`, else hand it to a detached reaper thread
///
/// Returns `true` if the child was reaped here.
fn reap_bounded(mut child: Child, grace: Duration, poll: Duration) -> bool {
    let pid = child.id();
    let deadline = Instant::now() + grace;

    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep(poll.min(deadline - now));
            }
            Err(e) => {
                warn!(pid, error = %e, "failed to reap worker");
                return false;
            }
        }
    }

    warn!(
        pid,
        grace_ms = grace.as_millis() as u64,
        "worker still alive after kill, handing off to reaper thread"
    );
    let reaper = thread::Builder::new()
        .name(WORKER_IO_THREAD_NAME.to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!(pid, %status, "late worker reaped"),
            Err(e) => warn!(pid, error = %e, "failed to reap late worker"),
        });
    if let Err(e) = reaper {
        warn!(pid, error = %e, "could not start reaper thread, worker left unreaped");
    }
    false
}

/// SIGKILL the worker's process group, falling back to the child alone
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            warn!(pgid = pgid.as_raw(), error = %e, "group SIGKILL failed, killing worker only");
            let _ = child.kill();
        }
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    let _ = child.kill();
}
