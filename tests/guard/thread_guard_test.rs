/*!
 * Thread Guard Tests
 * Soft timeouts, abandoned threads and error passthrough
 */

use pretty_assertions::assert_eq;
use safe_fs::fs::local;
use safe_fs::{FsError, GuardMetrics, SafeFsError, SoftTimeout, ThreadTimeoutGuard, TimeoutSpec};
use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn millis(ms: u64) -> TimeoutSpec {
    TimeoutSpec::from_millis(ms).unwrap()
}

#[test]
fn test_in_time_result_matches_direct_call() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("payload.bin");
    fs::write(&file, vec![1u8; 4096]).unwrap();

    let guard = ThreadTimeoutGuard::new();
    let direct = local::file_size(&file).unwrap();
    let path = file.clone();
    let guarded = guard
        .execute("file_size", move || local::file_size(&path), millis(2000), "")
        .unwrap();

    assert_eq!(guarded, direct);
}

#[test]
fn test_sleeping_operation_raises_hang_within_budget() {
    let metrics = Arc::new(GuardMetrics::new());
    let guard = ThreadTimeoutGuard::with_metrics(Arc::clone(&metrics));
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let start = Instant::now();
    let result: Result<u64, _> = guard.execute(
        "file_size",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(600));
            Ok(1)
        },
        millis(100),
        "slow-mount",
    );
    let elapsed = start.elapsed();

    assert!(matches!(result, Err(SafeFsError::HangDetected { .. })));
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(500), "took {:?}", elapsed);
    assert_eq!(metrics.snapshot().hangs, 1);

    // The abandoned thread still completes exactly once
    thread::sleep(Duration::from_millis(800));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.abandoned_threads(), 0);
}

#[test]
fn test_primitive_error_is_not_a_hang() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent");

    let guard = ThreadTimeoutGuard::new();
    let err = guard
        .execute("file_size", move || local::file_size(&missing), millis(2000), "job-3")
        .unwrap_err();

    assert!(!err.is_timeout());
    assert!(matches!(err, SafeFsError::Fs(FsError::NotFound(_))));
}

#[test]
fn test_concurrent_guards_are_independent() {
    let guard = Arc::new(ThreadTimeoutGuard::new());

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let guard = Arc::clone(&guard);
            thread::spawn(move || {
                guard.execute(
                    "file_size",
                    move || {
                        if i % 2 == 0 {
                            thread::sleep(Duration::from_millis(400));
                        }
                        Ok(i)
                    },
                    millis(150),
                    "",
                )
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        if i % 2 == 0 {
            assert!(matches!(result, Err(SafeFsError::HangDetected { .. })));
        } else {
            assert_eq!(result.unwrap(), i as u64);
        }
    }
}
