/*!
 * Worker Process Tests
 * Hard timeouts against the real `safefs worker` binary and stand-in programs
 */

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use pretty_assertions::assert_eq;
use safe_fs::fs::{ExistsCheck, SizeQuery};
use safe_fs::{
    FsError, GuardOutcome, ProcessSupervisor, RetryConfig, SafeFileSystem, SafeFsConfig,
    SafeFsError, TimeoutSpec, WorkerConfig, WorkerSupervisor,
};
use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn worker() -> WorkerConfig {
    WorkerConfig::new(env!("CARGO_BIN_EXE_safefs"))
}

fn millis(ms: u64) -> TimeoutSpec {
    TimeoutSpec::from_millis(ms).unwrap()
}

#[test]
fn test_real_worker_reports_size() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("disk.img");
    fs::write(&file, vec![0u8; 10_000]).unwrap();

    let supervisor = WorkerSupervisor::new(worker());
    let outcome = supervisor
        .submit(&SizeQuery::new(&file), TimeoutSpec::from_secs(10).unwrap(), "it")
        .unwrap();

    assert_eq!(outcome, GuardOutcome::Success(10_000));
}

#[test]
fn test_real_worker_reports_missing_path_as_failure() {
    let dir = TempDir::new().unwrap();
    let safe = SafeFileSystem::with_config(SafeFsConfig::new().with_worker(worker()));

    let start = Instant::now();
    let err = safe
        .file_size_process(dir.path().join("missing"), Some(TimeoutSpec::from_secs(10).unwrap()), "")
        .unwrap_err();

    assert!(matches!(err, SafeFsError::GuardFailure { .. }));
    assert!(matches!(err.fs_error(), Some(FsError::NotFound(_))));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(safe.stats().retries, 0);
}

#[test]
fn test_exists_is_idempotent_across_workers() {
    let dir = TempDir::new().unwrap();
    let supervisor = WorkerSupervisor::new(worker());
    let timeout = TimeoutSpec::from_secs(10).unwrap();

    for _ in 0..3 {
        assert_eq!(
            supervisor
                .submit(&ExistsCheck::new(dir.path()), timeout, "")
                .unwrap(),
            GuardOutcome::Success(true)
        );
        assert_eq!(
            supervisor
                .submit(&ExistsCheck::new(dir.path().join("nope")), timeout, "")
                .unwrap(),
            GuardOutcome::Success(false)
        );
    }
}

#[test]
fn test_hung_worker_exhausts_size_retries() {
    let config = SafeFsConfig::new().with_worker(WorkerConfig::new("sleep").with_args(["30"]));
    let safe = SafeFileSystem::with_config(config);

    let start = Instant::now();
    let err = safe
        .file_size_process("/mnt/nas/stuck", Some(millis(200)), "hung")
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        SafeFsError::RetryExhausted { attempts, timeout, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);

    let stats = safe.stats();
    assert_eq!(stats.kills, 3);
    assert_eq!(stats.process_timeouts, 3);
}

#[test]
fn test_hung_exists_is_not_retried_by_default() {
    let config = SafeFsConfig::new()
        .with_worker(WorkerConfig::new("sleep").with_args(["30"]))
        .with_retries(RetryConfig::new());
    let safe = SafeFileSystem::with_config(config);

    let err = safe
        .exists_process("/mnt/nas/stuck", Some(millis(150)), "")
        .unwrap_err();

    assert!(matches!(err, SafeFsError::RetryExhausted { attempts: 1, .. }));
    assert_eq!(safe.stats().kills, 1);
}

#[test]
fn test_timed_out_child_does_not_survive() {
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("worker.pid");
    let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());

    let supervisor = WorkerSupervisor::new(WorkerConfig::new("sh").with_args(["-c", script.as_str()]));
    let outcome = supervisor
        .submit(&SizeQuery::new("/any"), millis(500), "")
        .unwrap();
    assert!(outcome.is_timeout());

    let pid: i32 = fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(kill(Pid::from_raw(pid), None::<Signal>), Err(Errno::ESRCH));
}

#[test]
fn test_large_request_to_unread_stdin_still_times_out() {
    // Larger than a pipe buffer, and `sleep` never reads its stdin
    let path = "a/".repeat(100_000);
    let supervisor = WorkerSupervisor::new(WorkerConfig::new("sleep").with_args(["3"]));

    let start = Instant::now();
    let outcome = supervisor
        .submit(&SizeQuery::new(path), millis(200), "")
        .unwrap();

    assert!(outcome.is_timeout());
    assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
}
