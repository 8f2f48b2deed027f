//! End-to-end tests of the `lxpanel` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
[manager]
endpoint = "http://127.0.0.1:9"
api_key = "test-key"
connect_timeout_secs = 1
request_timeout_secs = 1

[account]
hostname = "c-1042"
network_mode = "mode1"
nat_limit = 5
"#;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    path
}

fn lxpanel(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lxpanel").unwrap();
    cmd.env_remove("LXPANEL_API_KEY")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn help_lists_panels() {
    Command::cargo_bin("lxpanel")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("nat"))
        .stdout(predicate::str::contains("ipv6"))
        .stdout(predicate::str::contains("proxy"));
}

#[test]
fn rejected_check_prints_error_reply() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    lxpanel(&config)
        .args(["nat", "check", "--port", "80"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""status": "error""#))
        .stdout(predicate::str::contains(
            "External port must be between 10000 and 65535",
        ));
}

#[test]
fn disabled_feature_prints_error_reply() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    lxpanel(&config)
        .args(["ipv6", "add", "--description", "web"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Dedicated IPv6 binding is not enabled"));
}

#[test]
fn invalid_proxy_domain_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    lxpanel(&config)
        .args(["proxy", "del", " "])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Missing domain"));
}

#[test]
fn missing_config_fails() {
    let dir = TempDir::new().unwrap();

    lxpanel(&dir.path().join("absent.toml"))
        .args(["nat", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.toml"));
}
