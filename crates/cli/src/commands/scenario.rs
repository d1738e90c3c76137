// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario command
//!
//! Plays the classic three-party admission sequence against one coordinator:
//! A runs an async modification, B queries beside it, and C's modification
//! waits until A is done.

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Context};
use clap::Args;
use jobctl_core::{Coordinator, CoordinatorConfig, JobId, JobType, ResourceRef};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// How long A keeps the async job once C is queued
const HOLD: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct ScenarioArgs {
    /// Coordinator configuration file (TOML); defaults to a 1s wait limit
    /// and at most 5 queued jobs
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize)]
struct Step {
    at_ms: u64,
    actor: &'static str,
    action: String,
    job: Option<JobId>,
}

#[derive(Serialize)]
struct ScenarioReport {
    resource: ResourceRef,
    steps: Vec<Step>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario on {}", self.resource)?;
        for step in &self.steps {
            write!(f, "  {:>5}ms  {}  {}", step.at_ms, step.actor, step.action)?;
            if let Some(job) = step.job {
                write!(f, " (job {})", job)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct Trace {
    started: Instant,
    steps: Mutex<Vec<Step>>,
}

impl Trace {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, actor: &'static str, action: impl Into<String>, job: Option<JobId>) {
        let at_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let step = Step {
            at_ms,
            actor,
            action: action.into(),
            job,
        };
        tracing::info!(actor, action = %step.action, job = ?job, "scenario step");
        self.steps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(step);
    }

    fn into_steps(self) -> Vec<Step> {
        self.steps.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

fn scenario_config() -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_async_allowed(true)
        .with_max_queued_jobs(Some(5))
        .with_wait_limit(Duration::from_millis(1000))
}

pub fn handle(args: ScenarioArgs) -> anyhow::Result<()> {
    let config = match args.config.as_deref() {
        Some(path) => super::load_config(Some(path))?,
        None => scenario_config(),
    };
    let resource = ResourceRef::Domain("scenario".to_string());
    let coord = Coordinator::for_resource(resource.clone(), config);
    let trace = Trace::new();

    run(&coord, &trace)?;

    let report = ScenarioReport {
        resource,
        steps: trace.into_steps(),
    };
    output::print(&report, args.format)
}

fn run(coord: &Coordinator, trace: &Trace) -> anyhow::Result<()> {
    let a = coord
        .begin_async_job(JobType::Modify)
        .context("A could not start the async job")?;
    trace.record("A", "began async modify", Some(a));

    thread::scope(|s| -> anyhow::Result<()> {
        s.spawn(|| -> anyhow::Result<()> {
            let b = coord.begin_job(JobType::Query).context("B was not admitted")?;
            trace.record("B", "began query", Some(b));
            coord.end_job()?;
            trace.record("B", "ended query", Some(b));
            Ok(())
        })
        .join()
        .map_err(|_| anyhow!("B panicked"))??;

        let c = s.spawn(|| -> anyhow::Result<()> {
            trace.record("C", "waiting to modify", None);
            let c = coord.begin_job(JobType::Modify).context("C was not admitted")?;
            trace.record("C", "began modify", Some(c));
            coord.end_job()?;
            trace.record("C", "ended modify", Some(c));
            Ok(())
        });

        // Give C time to queue behind A unless it got through already
        let deadline = Instant::now() + Duration::from_secs(5);
        while coord.queued() == 0 && !c.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(HOLD);

        trace.record("A", "ending async modify", Some(a));
        coord.end_async_job()?;

        c.join().map_err(|_| anyhow!("C panicked"))?
    })
}
