// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config command

use crate::output::{self, OutputFormat};
use clap::Args;
use jobctl_core::{CoordinatorConfig, JobType};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Coordinator configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(transparent)]
struct EffectiveConfig {
    config: CoordinatorConfig,
}

impl fmt::Display for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = &self.config;
        let queue = match config.max_queued_jobs {
            Some(max) if max > 0 => max.to_string(),
            _ => "unlimited".to_string(),
        };
        let wait = match config.wait_deadline() {
            Some(limit) => humantime::format_duration(limit).to_string(),
            None => "indefinite".to_string(),
        };
        let mask: Vec<String> = config.async_mask.iter().map(type_name).collect();

        writeln!(f, "async_allowed:   {}", config.async_allowed)?;
        writeln!(f, "max_queued_jobs: {}", queue)?;
        writeln!(f, "wait_limit:      {}", wait)?;
        writeln!(f, "async_mask:      {}", mask.join(", "))
    }
}

fn type_name(job_type: &JobType) -> String {
    serde_json::to_value(job_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", job_type))
}

pub fn handle(args: ConfigArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    tracing::info!(?config, "effective configuration");
    output::print(&EffectiveConfig { config }, args.format)
}
