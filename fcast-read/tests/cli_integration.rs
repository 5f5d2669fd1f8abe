//! CLI integration tests for fcast-read

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Config pointing the API at a closed local port
fn setup_unreachable_api() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let state_path = temp_dir.path().join("state.json");

    fs::write(
        &config_path,
        format!(
            r#"
[state]
path = "{}"

[hub]
api_url = "http://127.0.0.1:9"
query_timeout_secs = 2
"#,
            escape_path_for_toml(&state_path.to_string_lossy())
        ),
    )
    .unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("fcast-read").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("notifications"))
        .stdout(predicate::str::contains("user"))
        .stdout(predicate::str::contains("feed"))
        .stdout(predicate::str::contains("trending"))
        .stdout(predicate::str::contains("thread"));
}

#[test]
fn test_search_help_shows_filters() {
    let mut cmd = Command::cargo_bin("fcast-read").unwrap();

    cmd.args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--min-followers"))
        .stdout(predicate::str::contains("--max-age"));
}

#[test]
fn test_missing_subcommand() {
    let mut cmd = Command::cargo_bin("fcast-read").unwrap();
    cmd.assert().failure().code(2);
}

#[test]
fn test_missing_api_key() {
    let (_temp_dir, config_path) = setup_unreachable_api();

    Command::cargo_bin("fcast-read")
        .unwrap()
        .env("FCAST_CONFIG", &config_path)
        .env_remove("NEYNAR_API_KEY")
        .args(["search", "rust"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("NEYNAR_API_KEY"));
}

#[test]
fn test_unreachable_api_is_network_error() {
    let (temp_dir, config_path) = setup_unreachable_api();

    Command::cargo_bin("fcast-read")
        .unwrap()
        .env("FCAST_CONFIG", &config_path)
        .env("NEYNAR_API_KEY", "test-key")
        .args(["trending", "--limit", "3"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Network error"));

    // Reads never create the state file
    assert!(!temp_dir.path().join("state.json").exists());
}

#[test]
fn test_notifications_without_fid() {
    let (_temp_dir, config_path) = setup_unreachable_api();

    Command::cargo_bin("fcast-read")
        .unwrap()
        .env("FCAST_CONFIG", &config_path)
        .env("NEYNAR_API_KEY", "test-key")
        .env_remove("FARCASTER_FID")
        .arg("notifications")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("No FID"));
}
