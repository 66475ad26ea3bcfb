//! `ionwf config` behavior against a scratch config file.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ionwf(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ionwf").expect("binary builds");
    cmd.env("IONWF_CONFIG", config);
    cmd
}

#[test]
fn set_then_get_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.yaml");

    ionwf(&config)
        .args(["config", "set", "server.port", "9100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set server.port = 9100"));

    ionwf(&config)
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9100"));
}

#[test]
fn show_json_reports_both_keys() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.yaml");

    ionwf(&config)
        .args(["config", "set", "server.host", "127.0.0.1"])
        .assert()
        .success();

    let output = ionwf(&config)
        .args(["config", "show", "--json"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["host"], "127.0.0.1");
    assert_eq!(value["port"], 8000);
}

#[test]
fn defaults_apply_without_a_config_file() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("missing.yaml");

    ionwf(&config)
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8000"));
}

#[test]
fn unknown_key_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.yaml");

    ionwf(&config)
        .args(["config", "set", "server.shoesize", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server.shoesize"));
}

#[test]
fn invalid_port_is_rejected_and_not_saved() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.yaml");

    ionwf(&config)
        .args(["config", "set", "server.port", "70000"])
        .assert()
        .failure();

    ionwf(&config)
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8000"));
}

#[test]
fn zero_port_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.yaml");

    ionwf(&config)
        .args(["config", "set", "server.port", "0"])
        .assert()
        .failure();
}
