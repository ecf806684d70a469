use std::io::Write;

use assert_cmd::Command;
use oddsfeed::testkit::config::{minimal_toml, sample_toml};
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn check_config_prints_summary() {
    let file = write_temp_config(&sample_toml());

    Command::cargo_bin("oddsfeed")
        .unwrap()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Configuration file is valid"))
        .stdout(predicate::str::contains("Timeframes: 5s, 1m, 5m, 15m"))
        .stdout(predicate::str::contains("EURUSD"));
}

#[test]
fn check_config_returns_nonzero_on_invalid_value() {
    let toml = minimal_toml().replace("volatility = 0.001", "volatility = 0.0");
    let file = write_temp_config(&toml);

    Command::cargo_bin("oddsfeed")
        .unwrap()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for volatility"));
}

#[test]
fn check_config_rejects_oversized_timeframe() {
    let toml = format!(
        "[engine]\nderived_timeframes = [\"300000000000000d\"]\n\n{}",
        minimal_toml()
    );
    let file = write_temp_config(&toml);

    Command::cargo_bin("oddsfeed")
        .unwrap()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"))
        .stderr(predicate::str::contains("too large"));
}

#[test]
fn check_config_reports_missing_file() {
    Command::cargo_bin("oddsfeed")
        .unwrap()
        .args(["check", "config", "--config", "/nonexistent/oddsfeed.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn run_fails_fast_on_invalid_config() {
    let file = write_temp_config("[engine]\ntick_interval_ms = 0\n");

    Command::cargo_bin("oddsfeed")
        .unwrap()
        .args(["run", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn unknown_subcommand_is_rejected() {
    Command::cargo_bin("oddsfeed")
        .unwrap()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
