//! Configuration errors must abort before any network activity, with a
//! diagnostic on stderr.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mirrorbot() -> Command {
    Command::cargo_bin("mirrorbot").expect("binary built")
}

#[test]
fn missing_config_file_aborts_with_diagnostic() {
    mirrorbot()
        .args(["pages", "Foo", "--config", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read config"));
}

#[test]
fn malformed_json_aborts_with_path_in_message() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    mirrorbot()
        .args(["pages", "Foo"])
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn single_site_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "wiki": { "reko": { "name": "Reko", "url": "https://r.example/api.php",
             "botName": "Bot@sync", "botPassword": "pw" } } }"#,
    )
    .unwrap();

    mirrorbot()
        .args(["files"])
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least two"));
}

#[test]
fn site_with_blank_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "wiki": {
             "a": { "name": "A", "url": "", "botName": "b", "botPassword": "p" },
             "b": { "name": "B", "url": "https://b.example/api.php", "botName": "b", "botPassword": "p" }
           } }"#,
    )
    .unwrap();

    mirrorbot()
        .args(["pages", "Foo"])
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid site 'a'"));
}
