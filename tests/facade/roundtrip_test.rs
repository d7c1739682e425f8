/*!
 * Facade Round-Trip Tests
 * Copy, then check existence and size, under both guards
 */

use pretty_assertions::assert_eq;
use safe_fs::{
    CopyOptions, ExistingPolicy, FsError, SafeFileSystem, SafeFsConfig, SafeFsError, WorkerConfig,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn safe() -> SafeFileSystem {
    let worker = WorkerConfig::new(env!("CARGO_BIN_EXE_safefs"));
    SafeFileSystem::with_config(SafeFsConfig::new().with_worker(worker))
}

fn seed_tree(root: &Path) {
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    fs::write(root.join("top.txt"), b"top level").unwrap();
    fs::write(root.join("nested/mid.txt"), vec![b'm'; 2048]).unwrap();
    fs::write(root.join("nested/deeper/leaf.txt"), b"leaf").unwrap();
}

#[test]
fn test_thread_copy_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    seed_tree(&src);
    let safe = safe();

    safe.copy_thread(&src, &dst, CopyOptions::default(), None, "rt-thread")
        .unwrap();

    for rel in ["top.txt", "nested/mid.txt", "nested/deeper/leaf.txt"] {
        assert!(safe.exists_thread(dst.join(rel), None, "").unwrap());
        assert_eq!(
            safe.file_size_thread(dst.join(rel), None, "").unwrap(),
            safe.file_size_thread(src.join(rel), None, "").unwrap()
        );
    }
}

#[test]
fn test_process_copy_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    seed_tree(&src);
    let safe = safe();

    safe.copy_process(&src, &dst, CopyOptions::default(), None, "rt-process")
        .unwrap();

    for rel in ["top.txt", "nested/mid.txt", "nested/deeper/leaf.txt"] {
        assert!(safe.exists_process(dst.join(rel), None, "").unwrap());
        assert_eq!(
            safe.file_size_process(dst.join(rel), None, "").unwrap(),
            safe.file_size_process(src.join(rel), None, "").unwrap()
        );
    }
}

#[test]
fn test_shallow_copy_skips_subdirectories() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    seed_tree(&src);
    let safe = safe();

    safe.copy_process(&src, &dst, CopyOptions::shallow(), None, "")
        .unwrap();

    assert!(safe.exists_thread(dst.join("top.txt"), None, "").unwrap());
    assert!(!safe.exists_thread(dst.join("nested/mid.txt"), None, "").unwrap());
}

#[test]
fn test_existing_destination_both_guards() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("b.txt");
    fs::write(&src, b"new contents").unwrap();
    fs::write(&dst, b"old").unwrap();
    let safe = safe();

    let thread_err = safe
        .copy_thread(&src, &dst, CopyOptions::default(), None, "")
        .unwrap_err();
    assert!(matches!(thread_err, SafeFsError::Fs(FsError::AlreadyExists(_))));

    let process_err = safe
        .copy_process(&src, &dst, CopyOptions::default(), None, "")
        .unwrap_err();
    assert!(matches!(process_err, SafeFsError::GuardFailure { .. }));
    assert!(matches!(process_err.fs_error(), Some(FsError::AlreadyExists(_))));

    safe.copy_process(
        &src,
        &dst,
        CopyOptions::default().with_existing(ExistingPolicy::Overwrite),
        None,
        "",
    )
    .unwrap();
    assert_eq!(fs::read(&dst).unwrap(), b"new contents");
}

#[test]
fn test_exists_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let safe = safe();
    let present = dir.path();
    let absent = dir.path().join("never-created");

    let first = (
        safe.exists_thread(present, None, "").unwrap(),
        safe.exists_thread(&absent, None, "").unwrap(),
    );
    for _ in 0..5 {
        assert_eq!(
            (
                safe.exists_thread(present, None, "").unwrap(),
                safe.exists_thread(&absent, None, "").unwrap(),
            ),
            first
        );
    }
    assert_eq!(first, (true, false));
}
