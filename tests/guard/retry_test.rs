/*!
 * Retry Policy Tests
 * Retry-on-timeout driven by scripted supervisors
 */

use pretty_assertions::assert_eq;
use safe_fs::fs::{FsOperation, SizeQuery};
use safe_fs::process::{StatusSupervisor, SupervisorError};
use safe_fs::{GuardMetrics, RetryPolicy, SafeFsError, TimeoutSpec};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Replays exit statuses in order, recording each submitted path
struct Script {
    statuses: Vec<i64>,
    calls: AtomicU32,
    seen: Mutex<Vec<String>>,
}

impl Script {
    fn new(statuses: &[i64]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn next(&self, op: &FsOperation) -> Result<i64, SupervisorError> {
        self.seen
            .lock()
            .unwrap()
            .push(op.path().display().to_string());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(self.statuses[n.min(self.statuses.len() - 1)])
    }
}

fn budget() -> TimeoutSpec {
    TimeoutSpec::from_secs(1).unwrap()
}

#[test]
fn test_default_size_budget_is_three_attempts() {
    let script = Script::new(&[-3]);
    let supervisor = StatusSupervisor::new(|op: &FsOperation, _, _: &str| script.next(op));
    let metrics = GuardMetrics::new();

    let err = RetryPolicy::new(2)
        .execute(&supervisor, &SizeQuery::new("/mnt/nas/stuck"), budget(), "ref-9", Some(&metrics))
        .unwrap_err();

    match err {
        SafeFsError::RetryExhausted { attempts, message, .. } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("/mnt/nas/stuck"));
            assert!(message.contains("ref-9"));
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *script.seen.lock().unwrap(),
        vec!["/mnt/nas/stuck".to_string(); 3]
    );

    let stats = metrics.snapshot();
    assert_eq!(stats.process_timeouts, 3);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.exhausted, 1);
}

#[test]
fn test_recovers_on_last_attempt() {
    let script = Script::new(&[-3, -3, 65536]);
    let supervisor = StatusSupervisor::new(|op: &FsOperation, _, _: &str| script.next(op));

    let size = RetryPolicy::new(2)
        .execute(&supervisor, &SizeQuery::new("/a"), budget(), "", None)
        .unwrap();

    assert_eq!(size, 65536);
    assert_eq!(script.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_failure_after_timeout_stops_immediately() {
    let script = Script::new(&[-3, -1, 10]);
    let supervisor = StatusSupervisor::new(|op: &FsOperation, _, _: &str| script.next(op));

    let err = RetryPolicy::new(2)
        .execute(&supervisor, &SizeQuery::new("/a"), budget(), "", None)
        .unwrap_err();

    assert!(matches!(err, SafeFsError::GuardFailure { .. }));
    assert_eq!(script.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_each_call_starts_a_fresh_budget() {
    let script = Script::new(&[-3, -3, -3, 5]);
    let supervisor = StatusSupervisor::new(|op: &FsOperation, _, _: &str| script.next(op));
    let policy = RetryPolicy::new(2);

    assert!(policy
        .execute(&supervisor, &SizeQuery::new("/a"), budget(), "", None)
        .is_err());
    assert_eq!(
        policy
            .execute(&supervisor, &SizeQuery::new("/a"), budget(), "", None)
            .unwrap(),
        5
    );
    assert_eq!(script.calls.load(Ordering::SeqCst), 4);
}
