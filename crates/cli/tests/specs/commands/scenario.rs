//! Scenario command specs
//!
//! A background modification admits a query beside it and makes a second
//! modification wait until it ends.

use crate::prelude::*;

#[test]
fn scenario_trace_shows_admission_order() {
    let run = jobctl().args(["scenario"]).passes();
    let stdout = run.stdout();

    let order = [
        "A  began async modify",
        "B  began query",
        "C  waiting to modify",
        "A  ending async modify",
        "C  began modify",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|step| {
            stdout
                .find(step)
                .unwrap_or_else(|| panic!("missing step {step:?} in:\n{stdout}"))
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{stdout}");
}

#[test]
fn scenario_json_lists_steps() {
    let json = jobctl()
        .args(["scenario", "--format", "json"])
        .passes()
        .stdout_json();

    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 7);
    assert_eq!(json["resource"]["kind"], "domain");

    // B and C run in the sync slot, A in the async slot
    let job_of = |actor: &str, action: &str| {
        steps
            .iter()
            .find(|s| s["actor"] == actor && s["action"] == action)
            .map(|s| s["job"].clone())
            .unwrap()
    };
    assert_eq!(job_of("B", "began query"), job_of("C", "began modify"));
    assert_ne!(job_of("A", "began async modify"), job_of("B", "began query"));
}

#[test]
fn scenario_fails_without_async_slot() {
    let temp = Project::empty();
    temp.file("sync-only.toml", "async_allowed = false\n");

    temp.jobctl()
        .args(["scenario", "--config", "sync-only.toml"])
        .fails()
        .stderr_has("async jobs are not allowed");
}

#[test]
fn verbose_flag_logs_steps() {
    jobctl()
        .args(["-v", "scenario"])
        .passes()
        .stderr_has("scenario step");
}
