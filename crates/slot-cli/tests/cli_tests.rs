//! Integration tests for the `slots` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the available,
//! check, to-utc and windows subcommands through the actual binary, including
//! stdin input, policy files, exit codes and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn day_json() -> String {
    std::fs::read_to_string(fixture("day.json")).expect("day.json fixture must exist")
}

fn slots() -> Command {
    Command::cargo_bin("slots").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// available
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn available_lists_free_times_around_bookings() {
    let expected = [
        "09:00", "09:30", "11:00", "11:30", "13:00", "13:30", "14:00", "14:30", "15:00", "15:30",
        "16:00", "16:30",
    ]
    .iter()
    .map(|t| format!("{t}\n"))
    .collect::<String>();

    slots()
        .args(["available", "-i", &fixture("day.json")])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn available_reads_stdin_and_prints_json() {
    let output = slots()
        .args(["available", "--json"])
        .write_stdin(day_json())
        .output()
        .unwrap();
    assert!(output.status.success());

    let times: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(times.len(), 12);
    assert_eq!(times[0], "09:00");
    assert!(!times.contains(&"10:00".to_string()), "booked 10:00-11:00 local");
    assert!(times.contains(&"14:00".to_string()), "cancelled booking frees 14:00");
}

#[test]
fn available_applies_policy_file() {
    slots()
        .args(["available", "-i", &fixture("day.json")])
        .args(["--config", &fixture("policy.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("09:15\n"))
        .stdout(predicate::str::contains("11:15\n"))
        .stdout(predicate::str::contains("11:00\n").not())
        .stdout(predicate::str::contains("10:45\n").not());
}

#[test]
fn available_honors_lead_time_from_now() {
    // 16:00Z is 11:00 in New York; two hours of notice pushes past lunch.
    slots()
        .args(["available", "-i", &fixture("day.json")])
        .args(["--now", "2024-01-15T16:00:00Z", "--lead-minutes", "120"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("13:00\n"))
        .stdout(predicate::str::contains("11:30").not());
}

#[test]
fn available_rejects_invalid_policy() {
    slots()
        .args(["available", "-i", &fixture("day.json")])
        .args(["--config", &fixture("bad_policy.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("searchBandDays"));
}

#[test]
fn available_reports_missing_file() {
    slots()
        .args(["available", "-i", "/nonexistent/day.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn available_reports_malformed_request() {
    slots()
        .arg("available")
        .write_stdin(r#"{"timezone": "UTC"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse day request JSON"));
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_accepts_a_free_time_and_prints_utc() {
    slots()
        .args(["check", "-i", &fixture("day.json"), "--time", "14:00"])
        .assert()
        .success()
        .stdout("OK 2024-01-15T19:00:00Z\n");
}

#[test]
fn check_rejects_overlap_with_exit_code_two() {
    slots()
        .args(["check", "-i", &fixture("day.json"), "--time", "10:30"])
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with("REJECTED conflict"));
}

#[test]
fn check_rejects_time_outside_working_hours() {
    slots()
        .args(["check", "-i", &fixture("day.json"), "--time", "11:45"])
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with("REJECTED out_of_schedule"));
}

#[test]
fn check_rejects_past_time() {
    slots()
        .args(["check", "-i", &fixture("day.json"), "--time", "09:00"])
        .args(["--now", "2024-01-15T15:00:00Z"])
        .assert()
        .code(2)
        .stdout(predicate::str::starts_with("REJECTED past_time"));
}

#[test]
fn check_rejects_malformed_time_argument() {
    slots()
        .args(["check", "-i", &fixture("day.json"), "--time", "25:00"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("invalid value '25:00'"));
}

// ─────────────────────────────────────────────────────────────────────────────
// to-utc
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn to_utc_converts_ordinary_time() {
    slots()
        .args(["to-utc", "--date", "2024-01-15", "--time", "10:00", "--tz", "America/New_York"])
        .assert()
        .success()
        .stdout("2024-01-15T15:00:00Z\n");
}

#[test]
fn to_utc_exact_differs_on_transition_day() {
    let base = ["to-utc", "--date", "2024-03-10", "--time", "03:30", "--tz", "America/New_York"];

    slots()
        .args(base)
        .assert()
        .success()
        .stdout("2024-03-10T08:30:00Z\n");

    slots()
        .args(base)
        .arg("--exact")
        .assert()
        .success()
        .stdout("2024-03-10T07:30:00Z\n");
}

#[test]
fn to_utc_reports_unknown_timezone() {
    slots()
        .args(["to-utc", "--date", "2024-01-15", "--time", "10:00", "--tz", "Mars/Base"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

// ─────────────────────────────────────────────────────────────────────────────
// windows
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn windows_prints_split_shift() {
    slots()
        .args(["windows", "-i", &fixture("schedule.json"), "--date", "2024-01-15"])
        .assert()
        .success()
        .stdout("09:00-12:00\n13:00-17:00\n");
}

#[test]
fn windows_reports_closed_override() {
    slots()
        .args(["windows", "-i", &fixture("schedule.json"), "--date", "2024-01-22"])
        .assert()
        .success()
        .stdout("closed\n");
}

#[test]
fn help_lists_subcommands() {
    slots()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("available"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("to-utc"))
        .stdout(predicate::str::contains("windows"));
}
