// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod config;
pub mod scenario;
pub mod stress;

use anyhow::Context;
use jobctl_core::CoordinatorConfig;
use std::path::Path;

/// Load a coordinator configuration, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<CoordinatorConfig> {
    match path {
        Some(path) => CoordinatorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(CoordinatorConfig::default()),
    }
}

/// Parse a humantime duration such as `250ms` or `2s`
pub fn parse_duration(s: &str) -> Result<std::time::Duration, String> {
    humantime::parse_duration(s).map_err(|e| format!("invalid duration '{}': {}", s, e))
}
