//! Config command specs
//!
//! Verify the effective configuration is printed.

use crate::prelude::*;

#[test]
fn defaults_are_printed_as_text() {
    jobctl()
        .args(["config"])
        .passes()
        .stdout_has("async_allowed:   true")
        .stdout_has("max_queued_jobs: unlimited")
        .stdout_has("wait_limit:      30s")
        .stdout_has("async_mask:      query");
}

#[test]
fn config_file_overrides_defaults() {
    let temp = Project::empty();
    temp.file(
        "jobctl.toml",
        "max_queued_jobs = 5\nwait_limit = \"0s\"\nasync_mask = [\"query\", \"query_unsafe\"]\n",
    );

    temp.jobctl()
        .args(["config", "--config", "jobctl.toml"])
        .passes()
        .stdout_has("max_queued_jobs: 5")
        .stdout_has("wait_limit:      indefinite")
        .stdout_has("async_mask:      query, query_unsafe");
}

#[test]
fn json_output_uses_config_keys() {
    let json = jobctl()
        .args(["config", "--format", "json"])
        .passes()
        .stdout_json();

    assert_eq!(json["async_allowed"], true);
    assert_eq!(json["wait_limit"], "30s");
    assert_eq!(json["async_mask"], serde_json::json!(["query"]));
}

#[test]
fn unknown_key_fails() {
    let temp = Project::empty();
    temp.file("bad.toml", "max_waiters = 3\n");

    temp.jobctl()
        .args(["config", "--config", "bad.toml"])
        .fails()
        .stderr_has("max_waiters");
}

#[test]
fn none_in_mask_fails() {
    let temp = Project::empty();
    temp.file("bad.toml", "async_mask = [\"none\"]\n");

    temp.jobctl()
        .args(["config", "--config", "bad.toml"])
        .fails()
        .stderr_has("async_mask");
}
