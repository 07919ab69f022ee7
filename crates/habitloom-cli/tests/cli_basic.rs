//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory and checks the JSON it prints.

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_habitloom"))
        .args(args)
        .env("HABITLOOM_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "calendar.timezone", "UTC"]);
    assert_eq!(code, 0, "config set failed: {stderr}");
    dir
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("not JSON ({e}): {stdout}"))
}

#[test]
fn test_config_get_and_set() {
    let dir = workspace();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "calendar.timezone"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "UTC");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "calendar.week_start", "sunday"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "calendar.week_start"]);
    assert_eq!(stdout.trim(), "sunday");
}

#[test]
fn test_config_unknown_key_fails() {
    let dir = workspace();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_reset() {
    let dir = workspace();
    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "timer.max_session_minutes"]);
    assert_eq!(stdout.trim(), "120");
}

#[test]
fn test_habit_add_and_list() {
    let dir = workspace();
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["habit", "add", "Read", "--id", "read", "--reward", "2"],
    );
    assert_eq!(code, 0, "habit add failed: {stderr}");
    let habit = json(&stdout);
    assert_eq!(habit["id"], "read");
    assert_eq!(habit["rewardValue"], 2);

    let (code, stdout, _) = run_cli(dir.path(), &["habit", "list"]);
    assert_eq!(code, 0);
    let rows = json(&stdout);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["habit"]["name"], "Read");
    assert_eq!(rows[0]["running"], false);
}

#[test]
fn test_duplicate_habit_id_is_rejected() {
    let dir = workspace();
    run_cli(dir.path(), &["habit", "add", "Read", "--id", "read"]);
    let (code, _, stderr) = run_cli(dir.path(), &["habit", "add", "Again", "--id", "read"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_track_increment_and_decrement() {
    let dir = workspace();
    run_cli(dir.path(), &["habit", "add", "Floss", "--id", "floss", "--reward", "3"]);

    let (code, _, _) = run_cli(dir.path(), &["track", "inc", "floss"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["track", "today"]);
    let today = json(&stdout);
    assert_eq!(today["log"]["habits"]["floss"]["completions"], 3);
    assert_eq!(today["log"]["habits"]["floss"]["completed"], true);

    run_cli(dir.path(), &["track", "dec", "floss"]);
    let (_, stdout, _) = run_cli(dir.path(), &["track", "today"]);
    let today = json(&stdout);
    assert_eq!(today["log"]["habits"]["floss"]["completions"], 0);
    assert_eq!(today["log"]["habits"]["floss"]["completed"], false);

    // Nothing left to undo.
    let (code, stdout, _) = run_cli(dir.path(), &["track", "dec", "floss"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("unchanged"));
}

#[test]
fn test_track_mood_is_clamped() {
    let dir = workspace();
    let (code, _, _) = run_cli(dir.path(), &["track", "mood", "-9"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["track", "today"]);
    assert_eq!(json(&stdout)["log"]["mood"], -3);
}

#[test]
fn test_timer_toggle_and_status() {
    let dir = workspace();
    run_cli(dir.path(), &["habit", "add", "Practice", "--id", "practice", "--unit", "minutes"]);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "toggle", "practice"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerStarted"));

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0);
    // Status may be preceded by resume events; the status object is last.
    let start = stdout.rfind("{\n  \"date\"").unwrap();
    let status = json(&stdout[start..]);
    let running = status["running"].as_array().unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0]["habit_id"], "practice");
    assert_eq!(status["max_session_secs"], 7200);

    let (code, stdout, _) = run_cli(dir.path(), &["timer", "toggle", "practice"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("TimerStopped"));
}

#[test]
fn test_timer_toggle_unknown_habit_fails() {
    let dir = workspace();
    let (code, _, stderr) = run_cli(dir.path(), &["timer", "toggle", "ghost"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown habit"));
}

#[test]
fn test_habit_remove() {
    let dir = workspace();
    run_cli(dir.path(), &["habit", "add", "Read", "--id", "read"]);
    let (code, _, _) = run_cli(dir.path(), &["habit", "remove", "read"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["habit", "list"]);
    assert!(json(&stdout).as_array().unwrap().is_empty());
}

#[test]
fn test_stats_today_and_calendar_month() {
    let dir = workspace();
    run_cli(dir.path(), &["habit", "add", "Read", "--id", "read"]);
    run_cli(dir.path(), &["track", "inc", "read"]);

    let (code, stdout, _) = run_cli(dir.path(), &["stats", "today"]);
    assert_eq!(code, 0);
    let summary = json(&stdout);
    assert_eq!(summary["habits_completed"], 1);
    assert_eq!(summary["fragments"], 1);

    let (code, stdout, _) = run_cli(dir.path(), &["calendar", "month", "--year", "2024", "--month", "2"]);
    assert_eq!(code, 0);
    let cells = json(&stdout);
    assert_eq!(cells.as_array().unwrap().len() % 7, 0);

    let (code, _, _) = run_cli(dir.path(), &["calendar", "month", "--year", "2024", "--month", "13"]);
    assert_eq!(code, 1);
}

#[test]
fn test_unusable_data_dir_reports_storage_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let (code, _, stderr) = run_cli(&blocker, &["habit", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Storage error:"), "{stderr}");
}

#[test]
fn test_window_arguments_are_range_checked() {
    let dir = workspace();
    let (code, _, _) = run_cli(dir.path(), &["stats", "last", "200000000"]);
    assert_eq!(code, 2);
    let (code, _, _) = run_cli(dir.path(), &["calendar", "week", "--offset", "2147483647"]);
    assert_eq!(code, 2);
    let (code, stdout, _) = run_cli(dir.path(), &["calendar", "week", "--offset", "-52"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 7);
}
