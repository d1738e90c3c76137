//! Error handling specs

use crate::prelude::*;

#[test]
fn missing_subcommand_fails() {
    jobctl().fails().stderr_has("Usage");
}

#[test]
fn unknown_subcommand_fails() {
    jobctl().args(["frobnicate"]).fails();
}

#[test]
fn missing_config_file_reports_path() {
    let temp = Project::empty();
    temp.jobctl()
        .args(["config", "--config", "absent.toml"])
        .fails()
        .stderr_has("absent.toml");
}

#[test]
fn invalid_duration_is_rejected() {
    jobctl()
        .args(["stress", "--wait-limit", "soon"])
        .fails()
        .stderr_has("invalid duration");
}
