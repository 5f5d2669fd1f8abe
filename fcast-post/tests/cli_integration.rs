//! CLI integration tests for fcast-post
//!
//! Only paths that end before any network call are exercised: guard
//! rejections, argument errors, and credential problems.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const TEST_KEY: &str = "0x9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

struct TestEnv {
    temp_dir: TempDir,
    state_path: PathBuf,
    key_path: PathBuf,
}

/// Helper to create a test environment with a throwaway signer key
fn setup_test_env() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let state_path = temp_dir.path().join("state.json");
    let key_path = temp_dir.path().join("signer.json");

    fs::write(
        &key_path,
        format!(r#"{{"fid": 123, "signerPrivateKey": "{}"}}"#, TEST_KEY),
    )
    .unwrap();

    TestEnv {
        temp_dir,
        state_path,
        key_path,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

impl TestEnv {
    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("fcast-post").unwrap();
        cmd.env("FCAST_CONFIG", self.temp_dir.path().join("missing.toml"))
            .env("FARCASTER_STATE_PATH", &self.state_path)
            .env("SIGNER_KEY_PATH", &self.key_path)
            .env("NEYNAR_API_KEY", "test-key")
            .env_remove("FARCASTER_FID")
            .env_remove("RUST_LOG");
        cmd
    }

    fn seed_state(&self, state: serde_json::Value) {
        fs::write(&self.state_path, serde_json::to_string_pretty(&state).unwrap()).unwrap();
    }
}

#[test]
fn test_help_flag_output() {
    let mut cmd = Command::cargo_bin("fcast-post").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Publish a cast"))
        .stdout(predicate::str::contains("--channel"))
        .stdout(predicate::str::contains("--reply"))
        .stdout(predicate::str::contains("--cooldown-key"))
        .stdout(predicate::str::contains("--no-guards"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_version_flag_output() {
    let mut cmd = Command::cargo_bin("fcast-post").unwrap();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fcast-post"));
}

#[test]
fn test_empty_text_is_invalid_input() {
    let env = setup_test_env();

    env.command()
        .arg("   ")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn test_no_text_no_stdin_error() {
    let env = setup_test_env();

    env.command()
        .write_stdin("")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_bare_url_is_rejected() {
    let env = setup_test_env();

    env.command()
        .arg("https://example.com")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("content guard"))
        .stderr(predicate::str::contains("URL"));

    assert!(!env.state_path.exists());
}

#[test]
fn test_rejection_as_json() {
    let env = setup_test_env();

    let output = env
        .command()
        .args(["--format", "json", "my ssn is 123-45-6789"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["guard"], "pii");
    assert!(json["reason"].as_str().unwrap().contains("SSN"));
}

#[test]
fn test_stdin_text_is_guarded() {
    let env = setup_test_env();

    env.command()
        .write_stdin("abandon ability able about above absent absorb abstract absurd abuse access accident\n")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("seed phrase"));
}

#[test]
fn test_duplicate_from_existing_state() {
    let env = setup_test_env();
    env.seed_state(serde_json::json!({
        "casts": [{
            "text": "release notes are up",
            "hash": "0x01",
            "timestamp": now_millis() - 60_000,
        }],
        "cooldowns": {},
        "rateWindows": [],
    }));

    env.command()
        .arg("Release notes are up")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Duplicate"));
}

#[test]
fn test_min_interval_from_existing_state() {
    let env = setup_test_env();
    let recent = now_millis() - 5_000;
    env.seed_state(serde_json::json!({
        "casts": [{"text": "earlier cast", "hash": "0x01", "timestamp": recent}],
        "cooldowns": {},
        "rateWindows": [recent],
    }));

    env.command()
        .arg("a completely different cast")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("rate_limit guard"))
        .stderr(predicate::str::contains("Cooldown: wait"));
}

#[test]
fn test_target_cooldown_from_existing_state() {
    let env = setup_test_env();
    env.seed_state(serde_json::json!({
        "casts": [],
        "cooldowns": {"fid:3": now_millis() + 3_600_000},
        "rateWindows": [],
    }));

    env.command()
        .args(["--cooldown-key", "fid:3", "--cooldown", "1h", "thanks for the thread"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("cooldown guard"));
}

#[test]
fn test_cooldown_key_requires_duration() {
    let env = setup_test_env();

    env.command()
        .args(["--cooldown-key", "fid:3", "hello"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_reply_target() {
    let env = setup_test_env();

    env.command()
        .args(["--reply", "0xabc", "agreed"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("HASH:FID"));
}

#[test]
fn test_missing_api_key() {
    let env = setup_test_env();

    env.command()
        .env_remove("NEYNAR_API_KEY")
        .arg("hello there")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("NEYNAR_API_KEY"));
}

#[test]
fn test_missing_signer_key() {
    let env = setup_test_env();

    env.command()
        .env("SIGNER_KEY_PATH", env.temp_dir.path().join("nope.json"))
        .arg("hello there")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Signer"));
}
