//! End-to-end tests for the `ft` binary.
//!
//! Tests the full pipeline: record → events → stats → chart → timeline,
//! against a database in a temporary directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn ft_binary() -> String {
    env!("CARGO_BIN_EXE_ft").to_string()
}

/// Runs `ft` with an isolated home and database.
fn ft(temp: &Path, args: &[&str]) -> Output {
    Command::new(ft_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join("config"))
        .env("FT_DATABASE_PATH", temp.join("data/focustime.db"))
        .env_remove("FT_TOP_N")
        .args(args)
        .output()
        .expect("failed to run ft")
}

fn ft_ok(temp: &Path, args: &[&str]) -> String {
    let output = ft(temp, args);
    assert!(
        output.status.success(),
        "ft {args:?} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn record(temp: &Path, title: &str, at: &str) {
    let path = format!("/apps/{title}");
    ft_ok(
        temp,
        &[
            "record",
            "--path",
            path.as_str(),
            "--title",
            title,
            "--at",
            at,
        ],
    );
}

/// Seeds `[A@0, B@10, A@15, A@20, C@30]` (seconds past 09:00).
fn seed(temp: &Path) {
    for (title, at) in [
        ("A", "2024-03-01T09:00:00Z"),
        ("B", "2024-03-01T09:00:10Z"),
        ("A", "2024-03-01T09:00:15Z"),
        ("A", "2024-03-01T09:00:20Z"),
        ("C", "2024-03-01T09:00:30Z"),
    ] {
        record(temp, title, at);
    }
}

#[test]
fn test_stats_json_after_recording() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let stdout = ft_ok(
        temp.path(),
        &["stats", "--json", "--as-of", "2024-03-01T09:00:30Z"],
    );
    let stats: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(
        stats["time_per_app"],
        serde_json::json!([["A", 25_000], ["B", 5_000]])
    );
    assert_eq!(stats["total_time_in_apps"], 30_000);
    assert_eq!(stats["avg_time_in_app"], 15_000.0);

    let entries = stats["app_visited_entries"].as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries[3]["finish"].is_null());
    assert_eq!(entries[3]["app_title"], "C");
}

#[test]
fn test_events_lists_current_session() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let stdout = ft_ok(temp.path(), &["events"]);
    let events: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0]["title"], "A");
    assert_eq!(events[4]["offset"], 30_000);

    ft_ok(
        temp.path(),
        &["session", "start", "--at", "2024-03-01T10:00:00Z"],
    );
    let stdout = ft_ok(temp.path(), &["events"]);
    assert_eq!(stdout.trim(), "[]");

    let stdout = ft_ok(temp.path(), &["events", "--all"]);
    let events: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(events.len(), 5);
}

#[test]
fn test_chart_and_timeline() {
    let temp = TempDir::new().unwrap();
    seed(temp.path());

    let stdout = ft_ok(
        temp.path(),
        &[
            "chart",
            "--top",
            "1",
            "--json",
            "--as-of",
            "2024-03-01T09:00:40Z",
        ],
    );
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        rows,
        serde_json::json!([
            {"name": "A", "value": 25_000},
            {"name": "others", "value": 15_000}
        ])
    );

    let stdout = ft_ok(temp.path(), &["timeline"]);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let labels: Vec<_> = rows.iter().map(|r| r["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["A", "B", "A"]);
    assert_eq!(rows[2]["end"], "2024-03-01T09:00:30Z");
}

#[test]
fn test_out_of_order_record_is_rejected() {
    let temp = TempDir::new().unwrap();
    record(temp.path(), "A", "2024-03-01T09:00:10Z");

    let output = ft(
        temp.path(),
        &[
            "record",
            "--path",
            "/apps/B",
            "--title",
            "B",
            "--at",
            "2024-03-01T09:00:05Z",
        ],
    );
    assert!(!output.status.success());

    let stdout = ft_ok(temp.path(), &["events"]);
    let events: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(events.len(), 1);
}

#[test]
fn test_stats_without_session_fails() {
    let temp = TempDir::new().unwrap();
    let output = ft(temp.path(), &["stats"]);
    assert!(!output.status.success());
}

#[test]
fn test_migrate_from_stdin() {
    let temp = TempDir::new().unwrap();
    let legacy = r#"{
        "session": {"id": 1, "datetime": "2024-03-01T09:00:00Z"},
        "time_per_app": [["A", 10000], ["B", 5000]],
        "app_visited_entries": [],
        "avg_time_in_app": 0,
        "total_time_in_apps": 0
    }"#;

    let mut child = Command::new(ft_binary())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join("config"))
        .arg("migrate")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn ft migrate");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(legacy.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["schema_version"], 1);
    assert_eq!(stats["total_time_in_apps"], 15_000);
    assert_eq!(stats["avg_time_in_app"], 7_500.0);
}
