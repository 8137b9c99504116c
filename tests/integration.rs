//! Integration tests for interview-notify.

mod notify;
mod trigger;

use std::path::Path;
use std::process::{Command, Output};

use chrono::{Duration, Utc};
use interview_notify::analytics::{AnalyticsStore, InterviewRecord};
use interview_notify::trigger::InterviewOutcome;
use tempfile::TempDir;

/// Run the binary with an isolated home and working directory.
fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_interview-notify"))
        .args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute binary")
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["--help"]);
    assert!(output.status.success());
    let text = combined(&output);
    assert!(text.contains("run"), "Help should mention run");
    assert!(text.contains("stats"), "Help should mention stats");
    assert!(text.contains("prune"), "Help should mention prune");
}

#[test]
fn test_run_help_lists_flags() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["run", "--help"]);
    assert!(output.status.success());
    let text = combined(&output);
    for flag in [
        "--topic",
        "--log-dir",
        "--nick",
        "--no-check-bot-nicks",
        "--bot-nicks",
        "--mode",
        "--rate-limit",
        "--enable-analytics",
    ] {
        assert!(text.contains(flag), "Help should mention {flag}");
    }
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["--version"]);
    assert!(output.status.success());
    assert!(combined(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_without_topic_fails() {
    let home = TempDir::new().unwrap();
    let logs = home.path().join("logs");
    std::fs::create_dir(&logs).unwrap();

    let output = run_cli(
        home.path(),
        &["run", "--nick", "alice", "--log-dir", logs.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(combined(&output).contains("topic"));
}

#[test]
fn test_run_with_missing_log_dir_fails() {
    let home = TempDir::new().unwrap();
    let output = run_cli(
        home.path(),
        &[
            "run",
            "--topic",
            "t",
            "--nick",
            "alice",
            "--log-dir",
            "/nonexistent/interview-notify/logs",
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn test_invalid_mode_rejected() {
    let home = TempDir::new().unwrap();
    let output = run_cli(home.path(), &["run", "--mode", "ops"]);
    assert!(!output.status.success());
}

#[test]
fn test_malformed_config_file_fails() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".interview-notify.toml"), "topic = [").unwrap();
    let output = run_cli(home.path(), &["stats"]);
    assert!(!output.status.success());
}

#[test]
fn test_stats_without_database_fails() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing.db");
    let output = run_cli(home.path(), &["stats", "--db", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(combined(&output).contains("no statistics database"));
    assert!(!missing.exists());
}

async fn populate(db: &Path) {
    let store = AnalyticsStore::open(db).await.unwrap();
    let now = Utc::now();
    let records = [
        InterviewRecord::started("#red", "bob", now - Duration::hours(3), Some(12)).resolved(
            InterviewOutcome::Passed,
            now - Duration::hours(2),
            None,
        ),
        InterviewRecord::started("#red", "carol", now - Duration::hours(2), Some(8)).resolved(
            InterviewOutcome::Failed,
            now - Duration::hours(1),
            None,
        ),
        InterviewRecord::started("#orp", "dave", now - Duration::hours(1), None),
        InterviewRecord::started("#red", "erin", now - Duration::days(60), Some(30)),
    ];
    for record in &records {
        store.save_interview(record).await.unwrap();
    }
}

#[tokio::test]
async fn test_stats_json_report() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("history.db");
    populate(&db).await;

    let output = run_cli(
        home.path(),
        &["stats", "--db", db.to_str().unwrap(), "--days", "30", "--json"],
    );
    assert!(output.status.success(), "{}", combined(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["total"], 3);
    assert_eq!(report["stats"]["outcomes"]["passed"], 1);
    assert_eq!(report["stats"]["outcomes"]["failed"], 1);
    assert_eq!(report["stats"]["outcomes"]["pending"], 1);
    assert_eq!(report["stats"]["pass_rate"], 50.0);
    assert_eq!(report["recent"].as_array().unwrap().len(), 4);
    assert_eq!(report["recent"][0]["nick"], "dave");
}

#[tokio::test]
async fn test_stats_channel_filter() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("history.db");
    populate(&db).await;

    let output = run_cli(
        home.path(),
        &[
            "stats",
            "--db",
            db.to_str().unwrap(),
            "--channel",
            "#orp",
            "--json",
        ],
    );
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["total"], 1);
    assert_eq!(report["stats"]["channel"], "#orp");
}

#[tokio::test]
async fn test_stats_text_report() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("history.db");
    populate(&db).await;

    let output = run_cli(home.path(), &["stats", "--db", db.to_str().unwrap()]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Interview Statistics"));
    assert!(text.contains("Total interviews"));
    assert!(text.contains("carol"));
}

#[tokio::test]
async fn test_prune_removes_old_rows() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("history.db");
    populate(&db).await;

    let output = run_cli(
        home.path(),
        &["prune", "--db", db.to_str().unwrap(), "--days", "30"],
    );
    assert!(output.status.success(), "{}", combined(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("removed 1 interviews"));

    let store = AnalyticsStore::open(&db).await.unwrap();
    assert_eq!(store.count_interviews().await.unwrap(), 3);
}

#[tokio::test]
async fn test_huge_day_window_is_an_error() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("history.db");
    populate(&db).await;
    let db = db.to_str().unwrap();

    for args in [
        ["stats", "--db", db, "--days", "4000000000"],
        ["prune", "--db", db, "--days", "4000000000"],
    ] {
        let output = run_cli(home.path(), &args);
        let text = combined(&output);
        assert_eq!(output.status.code(), Some(1), "{text}");
        assert!(!text.contains("panicked"), "{text}");
        assert!(text.contains("out of range"), "{text}");
    }

    let store = AnalyticsStore::open(home.path().join("history.db")).await.unwrap();
    assert_eq!(store.count_interviews().await.unwrap(), 4);
}
