//! Integration tests for argument parsing and pre-flight failures.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

pub fn deploy_cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deploy-cli"));
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("DEPLOY_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join("deploy.config.yaml"), yaml).expect("write config");
}

const VALID: &str = r"
projectName: shop
prod:
  name: production
  script: mkdir -p dist && echo hi > dist/index.html
  host: 203.0.113.7
  port: 22
  username: deploy
  password: hunter2
  distPath: dist
  webDir: /srv/app
";

// --- Help and version ---

#[test]
fn test_cli_no_args_shows_help() {
    let dir = TempDir::new().expect("tempdir");
    // clap with arg_required_else_help shows help on stderr and exits 2
    deploy_cli(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("--connect-timeout"));
}

#[test]
fn test_cli_version_flag() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy-cli"));
}

#[test]
fn test_deploy_requires_environment_argument() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir).arg("deploy").assert().code(2);
}

#[test]
fn test_zero_timeout_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir)
        .args(["--connect-timeout", "0", "deploy", "prod"])
        .assert()
        .code(2);
}

// --- NO_COLOR as commonly set ---

#[test]
fn test_no_color_env_accepts_any_value() {
    let dir = TempDir::new().expect("tempdir");
    for value in ["1", "yes", "true"] {
        deploy_cli(&dir)
            .env("NO_COLOR", value)
            .args(["deploy", "prod"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Config file not found"));
    }
}

#[test]
fn test_no_color_env_does_not_break_init() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir)
        .env("NO_COLOR", "1")
        .arg("init")
        .assert()
        .success();
    assert!(dir.path().join("deploy.config.yaml").exists());
}

#[test]
fn test_no_color_env_with_invalid_config_reports_key() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, &VALID.replace("host: 203.0.113.7", "host: /"));
    deploy_cli(&dir)
        .env("NO_COLOR", "1")
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'host'"));
}

// --- Config failures exit 1 before any side effect ---

#[test]
fn test_deploy_without_config_points_at_init() {
    let dir = TempDir::new().expect("tempdir");
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"))
        .stderr(predicate::str::contains("deploy-cli init"));
}

#[test]
fn test_deploy_unknown_environment() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, VALID);
    deploy_cli(&dir)
        .args(["deploy", "staging"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'staging' is not defined"));
}

#[test]
fn test_deploy_placeholder_config_names_key_and_has_no_side_effects() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, &VALID.replace("host: 203.0.113.7", "host: /"));
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'host'"))
        .stderr(predicate::str::contains("'prod'"));
    assert!(!dir.path().join("dist").exists());
    assert!(!dir.path().join("dist.zip").exists());
}

#[test]
fn test_deploy_missing_credential() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, &VALID.replace("  password: hunter2\n", ""));
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'privateKey' or 'password'"));
}

#[test]
fn test_deploy_shell_unsafe_web_dir_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, &VALID.replace("webDir: /srv/app", "webDir: /srv/my app"));
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'webDir'"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_deploy_dist_path_outside_workdir_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, &VALID.replace("distPath: dist", "distPath: ."));
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'distPath'"));
    assert!(dir.path().join("deploy.config.yaml").exists());
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_deploy_malformed_yaml_names_file() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, "prod: [unclosed\n");
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("deploy.config.yaml"));
}

#[test]
fn test_deploy_config_flag_overrides_default_path() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("conf")).expect("mkdir");
    std::fs::write(
        dir.path().join("conf/other.yaml"),
        VALID.replace("username: deploy", "username: /"),
    )
    .expect("write");
    deploy_cli(&dir)
        .args(["--config", "conf/other.yaml", "deploy", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'username'"));
}

#[test]
fn test_deploy_without_terminal_does_not_build() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, VALID);
    // no TTY: the confirmation prompt cannot be shown, so nothing runs
    deploy_cli(&dir)
        .args(["deploy", "prod"])
        .write_stdin("y\n")
        .assert()
        .code(1);
    assert!(!dir.path().join("dist").exists());
    assert!(!dir.path().join("dist.zip").exists());
}
