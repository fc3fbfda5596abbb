//! CLI integration tests for the envmon command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Local session commands work against a seeded session file
//!
//! Note: These tests do not require a running backend.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the envmon binary with all state kept in `home`.
fn envmon(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("envmon").unwrap();
    cmd.env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("ENVMON_CONFIG_DIR", home.path().join("config"))
        .env("ENVMON_SESSION_FILE", session_path(home.path()))
        .env_remove("ENVMON_API_URL")
        .env_remove("ENVMON_TIMEOUT_SECS");
    cmd
}

fn session_path(home: &Path) -> PathBuf {
    home.join("session.json")
}

fn seed_session(home: &TempDir) {
    let user = serde_json::json!({
        "id": 7,
        "username": "ana",
        "email": "ana@example.org",
        "first_name": "Ana",
        "last_name": "Rojas"
    });
    let entries = serde_json::json!({
        "token": "A1",
        "refreshToken": "R1",
        "user": user.to_string(),
        "rememberedUsername": "ana"
    });
    std::fs::write(session_path(home.path()), entries.to_string()).unwrap();
}

fn read_session(home: &TempDir) -> serde_json::Map<String, serde_json::Value> {
    let raw = std::fs::read_to_string(session_path(home.path())).unwrap();
    serde_json::from_str(&raw).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("envmon"))
        .stdout(predicate::str::contains("environmental-monitoring"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("envmon"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("zones"))
        .stdout(predicate::str::contains("stations"))
        .stdout(predicate::str::contains("sensors"))
        .stdout(predicate::str::contains("readings"))
        .stdout(predicate::str::contains("alerts"))
        .stdout(predicate::str::contains("reports"))
        .stdout(predicate::str::contains("users"))
        .stdout(predicate::str::contains("roles"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_alerts_pending_conflicts_with_attended() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .args(["alerts", "list", "--pending", "--attended"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_readings_report_requires_dates() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .args(["readings", "report", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start"));
}

#[test]
fn test_invalid_alert_level_rejected() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .args(["alerts", "list", "--level", "catastrophic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Session Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_status_without_session() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_status_json_with_seeded_session() {
    let home = TempDir::new().unwrap();
    seed_session(&home);

    let output = envmon(&home)
        .args(["--json", "status"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let status: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(status["status"], "authenticated");
    assert_eq!(status["username"], "ana");
    assert_eq!(status["remembered_username"], "ana");
    assert_eq!(status["server_url"], "http://localhost:8000/api/");
}

#[test]
fn test_server_flag_overrides_base_url() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .args(["--json", "--server", "https://monitoreo.example.org/api", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://monitoreo.example.org/api/"));
}

#[test]
fn test_logout_clears_tokens_and_keeps_remembered_username() {
    let home = TempDir::new().unwrap();
    seed_session(&home);

    envmon(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let entries = read_session(&home);
    assert!(!entries.contains_key("token"));
    assert!(!entries.contains_key("refreshToken"));
    assert!(!entries.contains_key("user"));
    assert_eq!(entries["rememberedUsername"], "ana");
}

#[test]
fn test_logout_without_session() {
    let home = TempDir::new().unwrap();
    envmon(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_network_failure_keeps_session() {
    let home = TempDir::new().unwrap();
    seed_session(&home);

    envmon(&home)
        .args(["--server", "http://127.0.0.1:9/api/", "zones", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    let entries = read_session(&home);
    assert_eq!(entries["token"], "A1");
    assert_eq!(entries["refreshToken"], "R1");
}
