//! Stress command specs
//!
//! Many threads compete for one coordinator; the sync slot must never
//! admit two jobs at once.

use crate::prelude::*;

#[test]
fn sync_only_stress_keeps_exclusion() {
    let json = jobctl()
        .args([
            "stress",
            "--threads",
            "4",
            "--iterations",
            "50",
            "--wait-limit",
            "0s",
            "--format",
            "json",
        ])
        .passes()
        .stdout_json();

    assert_eq!(json["admitted"], 200);
    assert_eq!(json["timeouts"], 0);
    assert_eq!(json["max_concurrency"], 1);
}

#[test]
fn stress_with_async_job_keeps_exclusion() {
    let json = jobctl()
        .args([
            "stress",
            "--threads",
            "4",
            "--iterations",
            "20",
            "--with-async",
            "--format",
            "json",
        ])
        .passes()
        .stdout_json();

    assert_eq!(json["max_concurrency"], 1);
    assert!(json["async_admitted"].as_u64().unwrap() > 0);
}

#[test]
fn text_report_summarizes_run() {
    jobctl()
        .args(["stress", "--threads", "2", "--iterations", "5"])
        .passes()
        .stdout_has("2 threads x 5 iterations")
        .stdout_has("max concurrency: 1");
}

#[test]
fn zero_threads_is_rejected() {
    jobctl()
        .args(["stress", "--threads", "0"])
        .fails()
        .stderr_has("--threads");
}
