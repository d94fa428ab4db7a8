use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

const LINE_TIMEOUT: Duration = Duration::from_secs(5);

fn append(path: &Path, data: &[u8]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(data).unwrap();
}

/// Spawn followname and forward its stdout lines over a channel
fn spawn_follow(args: &[&str]) -> (Child, Receiver<String>) {
    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("followname"))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to execute followname");

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    (child, rx)
}

fn next_line(rx: &Receiver<String>) -> String {
    rx.recv_timeout(LINE_TIMEOUT).expect("no line within timeout")
}

// ============ CLI Tests ============

#[test]
fn test_help_flag() {
    Command::cargo_bin("followname")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--sleep-interval"))
        .stdout(predicate::str::contains("--all"))
        .stdout(predicate::str::contains("--end"))
        .stdout(predicate::str::contains("--follow"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("followname")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("followname"));
}

#[test]
fn test_missing_file_argument() {
    Command::cargo_bin("followname")
        .unwrap()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_sleep_interval() {
    Command::cargo_bin("followname")
        .unwrap()
        .args(["--sleep-interval=-2", "app.log"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid sleep interval"));
}

#[test]
fn test_non_numeric_sleep_interval() {
    Command::cargo_bin("followname")
        .unwrap()
        .args(["-s", "soon", "app.log"])
        .assert()
        .failure();
}

// ============ Follow Tests ============

#[test]
fn test_follow_all_then_appended() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, b"Line 1\nLine 2\n");

    let (mut child, rx) = spawn_follow(&["-a", "-s", "0.05", path.to_str().unwrap()]);
    assert_eq!(next_line(&rx), "Line 1");
    assert_eq!(next_line(&rx), "Line 2");

    append(&path, b"Line 3\r\n");
    assert_eq!(next_line(&rx), "Line 3");

    child.kill().unwrap();
    child.wait().unwrap();
}

#[test]
fn test_follow_survives_truncation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, b"first line of the old file\n");

    let (mut child, rx) = spawn_follow(&["--end", "-s", "0.05", path.to_str().unwrap()]);
    assert_eq!(next_line(&rx), "first line of the old file");

    std::fs::write(&path, b"New\n").unwrap();
    assert_eq!(next_line(&rx), "New");

    child.kill().unwrap();
    child.wait().unwrap();
}

#[cfg(unix)]
#[test]
fn test_follow_survives_rotation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, b"before\n");

    let (mut child, rx) = spawn_follow(&["-a", "-f", "-s", "0.05", path.to_str().unwrap()]);
    assert_eq!(next_line(&rx), "before");

    std::fs::rename(&path, dir.path().join("app.log.1")).unwrap();
    append(&path, b"Fresh\n");
    assert_eq!(next_line(&rx), "Fresh");

    child.kill().unwrap();
    child.wait().unwrap();
}

#[test]
fn test_follow_waits_for_file_to_appear() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("later.log");

    let (mut child, rx) = spawn_follow(&["-a", "-s", "0.05", path.to_str().unwrap()]);
    thread::sleep(Duration::from_millis(200));
    assert!(rx.try_recv().is_err());
    assert!(child.try_wait().unwrap().is_none());

    append(&path, b"appeared\n");
    assert_eq!(next_line(&rx), "appeared");

    child.kill().unwrap();
    child.wait().unwrap();
}

#[cfg(unix)]
#[test]
fn test_interrupt_exits_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    append(&path, b"ready\n");

    let (mut child, rx) = spawn_follow(&["-a", "-s", "0.05", path.to_str().unwrap()]);
    // The handler is installed before the first line is printed.
    assert_eq!(next_line(&rx), "ready");

    let pid = child.id().to_string();
    let sent = std::process::Command::new("kill")
        .args(["-INT", &pid])
        .status()
        .unwrap();
    assert!(sent.success());

    let mut waited = Duration::ZERO;
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if waited >= LINE_TIMEOUT {
            child.kill().unwrap();
            panic!("followname did not exit after SIGINT");
        }
        thread::sleep(Duration::from_millis(20));
        waited += Duration::from_millis(20);
    };
    assert_eq!(status.code(), Some(0));
}
