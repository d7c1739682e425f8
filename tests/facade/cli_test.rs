/*!
 * CLI Tests
 * The `safefs` binary end to end
 */

use pretty_assertions::assert_eq;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn safefs(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_safefs"))
        .args(args)
        .env_remove("SAFEFS_WORKER")
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_size_under_both_isolations() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("f.bin");
    fs::write(&file, vec![0u8; 321]).unwrap();
    let path = file.to_str().unwrap();

    for isolation in ["thread", "process"] {
        let output = safefs(&["size", path, "--isolation", isolation, "--timeout", "5"]);
        assert!(output.status.success(), "{:?}", output);
        assert_eq!(stdout(&output), "321");
    }
}

#[test]
fn test_exists_and_copy() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("in.txt");
    let dst = dir.path().join("out.txt");
    fs::write(&src, b"hello").unwrap();

    let output = safefs(&["exists", dst.to_str().unwrap()]);
    assert_eq!(stdout(&output), "false");

    let output = safefs(&["copy", src.to_str().unwrap(), dst.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);

    let output = safefs(&["exists", dst.to_str().unwrap(), "--isolation", "thread"]);
    assert_eq!(stdout(&output), "true");
}

#[test]
fn test_missing_path_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone");

    let output = safefs(&["size", missing.to_str().unwrap(), "--isolation", "thread"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not found"));
}

#[test]
fn test_rejects_non_positive_timeout() {
    let output = safefs(&["exists", "/tmp", "--timeout", "0"]);
    assert!(!output.status.success());
}
