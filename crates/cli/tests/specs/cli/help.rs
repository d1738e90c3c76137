//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    jobctl()
        .args(["--help"])
        .passes()
        .stdout_has("config")
        .stdout_has("scenario")
        .stdout_has("stress");
}

#[test]
fn version_is_printed() {
    jobctl().args(["--version"]).passes().stdout_has("jobctl");
}

#[test]
fn stress_help_documents_flags() {
    jobctl()
        .args(["stress", "--help"])
        .passes()
        .stdout_has("--threads")
        .stdout_has("--wait-limit")
        .stdout_has("--with-async");
}
