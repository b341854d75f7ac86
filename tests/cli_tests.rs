//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("arbhound")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            instruments = ["BTC/USDT"]

            [venues.binance]
            kind = "binance"

            [venues.kucoin]
            kind = "kucoin"
        "#,
    )
    .unwrap();

    Command::cargo_bin("arbhound")
        .unwrap()
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

#[test]
fn check_config_rejects_single_venue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
            instruments = ["BTC/USDT"]

            [venues.binance]
            kind = "binance"
        "#,
    )
    .unwrap();

    Command::cargo_bin("arbhound")
        .unwrap()
        .args(["check", "config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("venues"));
}

#[test]
fn check_config_reports_missing_file() {
    Command::cargo_bin("arbhound")
        .unwrap()
        .args(["check", "config", "--config", "/nonexistent/config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}
