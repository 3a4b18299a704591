//! Binary-level tests: argument handling, progress lines and report formats

use predicates::prelude::*;
use schedprobe::affinity::CpuAffinity;

/// First CPU this process may run on, so pinning never fails in CI sandboxes
fn allowed_cpu() -> String {
    CpuAffinity::current()
        .unwrap()
        .first()
        .unwrap()
        .to_string()
}

fn schedprobe() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("schedprobe");
    cmd.arg("--cpu").arg(allowed_cpu());
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("schedprobe");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--policies"));
}

#[test]
fn test_cli_requires_thread_count() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("schedprobe");
    cmd.args(["-t", "0.1", "-s", "FIFO", "-p", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--num-threads"));
}

#[test]
fn test_single_time_shared_thread_runs_three_iterations() {
    let output = schedprobe()
        .args(["-n", "1", "-t", "0.02", "-s", "NORMAL", "-p", "-1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("Thread 0 is running").count(), 3);
}

#[test]
fn test_out_of_range_fifo_priority_reported_not_fatal() {
    schedprobe()
        .args(["-n", "1", "-t", "0.02", "-s", "FIFO", "-p", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thread 0 create error:"))
        .stdout(predicate::str::contains("is running").not())
        .stderr(predicate::str::contains("0 started, 1 failed"));
}

#[test]
fn test_failure_does_not_stop_later_threads() {
    let output = schedprobe()
        .args(["-n", "2", "-t", "0.01", "-s", "FIFO,NORMAL", "-p", "200,0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Thread 0 create error:"));
    assert_eq!(stdout.matches("Thread 1 is running").count(), 3);
}

#[test]
fn test_strict_mode_exits_non_zero() {
    schedprobe()
        .args(["--strict", "-n", "2", "-t", "0.01", "-s", "FIFO,NORMAL", "-p", "200,0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Thread 1 is running").not())
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn test_short_lists_truncate_thread_count() {
    let output = schedprobe()
        .args(["-n", "3", "-t", "0.01", "-s", "NORMAL", "-p", "0,0,0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("Thread 0 is running").count(), 3);
    assert!(!stdout.contains("Thread 1"));
    assert!(!stdout.contains("Thread 2"));
}

#[test]
fn test_zero_threads_is_configuration_error() {
    schedprobe()
        .args(["-n", "0", "-t", "0.1", "-s", "FIFO", "-p", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("thread count must be at least 1"));
}

#[test]
fn test_unparseable_priority_is_configuration_error() {
    schedprobe()
        .args(["-n", "1", "-t", "0.1", "-s", "FIFO", "-p", "high"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid priority 'high'"));
}

#[test]
fn test_negative_wait_is_configuration_error() {
    schedprobe()
        .args(["-n", "1", "-t", "-0.5", "-s", "NORMAL", "-p", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wait time"));
}

#[test]
fn test_json_report_on_stdout() {
    let output = schedprobe()
        .args([
            "--format", "json", "-n", "2", "-t", "0.01", "-s", "NORMAL,FIFO", "-p", "0,200",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["threads_requested"], 2);
    assert_eq!(json["started"][0]["id"], 0);
    assert_eq!(json["started"][0]["iterations"].as_array().unwrap().len(), 3);
    assert_eq!(json["failures"][0]["id"], 1);
    assert_eq!(json["failures"][0]["kind"], "scheduling_unavailable");

    // progress lines moved out of the way of the document
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Thread 0 is running"));
}
