//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{no_cfg_perfstat_command, perfstat_command};

#[test]
fn test_small_interval() {
    no_cfg_perfstat_command()
        .arg("-i")
        .arg("99")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'--interval' must be greater"));
}

#[test]
fn test_invalid_interval() {
    no_cfg_perfstat_command()
        .arg("-i")
        .arg("every now and then")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--interval' was set with an invalid value",
        ));
}

#[test]
fn test_large_interval() {
    no_cfg_perfstat_command()
        .arg("-i")
        .arg("18446744073709551616")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--interval' was set with an invalid value",
        ));
}

#[test]
fn test_duration_shorter_than_interval() {
    no_cfg_perfstat_command()
        .args(["-i", "2s", "-d", "1s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--duration' must be at least as long as '--interval'",
        ));
}

#[test]
fn test_missing_config() {
    perfstat_command(&["-C", "./tests/valid_configs/does_not_exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_unknown_flag() {
    no_cfg_perfstat_command()
        .arg("--rate")
        .arg("1000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_help() {
    perfstat_command(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--disable-turboboost"));
}
