//! These tests are for testing some invalid config-file-specific options.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::perfstat_command;

#[test]
fn test_toml_mismatch_type() {
    perfstat_command(&["-C", "./tests/invalid_configs/toml_mismatch_type.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid type"));
}

#[test]
fn test_invalid_interval() {
    perfstat_command(&["-C", "./tests/invalid_configs/invalid_interval.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'interval' was set with an invalid value",
        ));
}

#[test]
fn test_small_interval() {
    perfstat_command(&["-C", "./tests/invalid_configs/small_interval.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 99ms"));
}

#[test]
fn test_invalid_job_level() {
    perfstat_command(&["-C", "./tests/invalid_configs/invalid_job_level.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant"));
}
