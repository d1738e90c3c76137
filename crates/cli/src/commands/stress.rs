// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stress command
//!
//! Hammers one coordinator from many threads and checks that the sync slot
//! never admits two jobs at once.

use crate::output::{self, OutputFormat};
use anyhow::anyhow;
use clap::Args;
use jobctl_core::{Coordinator, CoordinatorConfig, JobError, JobType};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Args)]
pub struct StressArgs {
    /// Worker threads competing for the sync slot
    #[arg(long, default_value = "4")]
    pub threads: usize,

    /// Admissions attempted per worker
    #[arg(long, default_value = "100")]
    pub iterations: usize,

    /// Admission deadline (e.g. 250ms, 5s); 0s waits indefinitely
    #[arg(long, default_value = "5s", value_parser = super::parse_duration)]
    pub wait_limit: Duration,

    /// Also cycle an async job so the admission mask comes into play
    #[arg(long)]
    pub with_async: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Debug, Default, Serialize)]
struct StressReport {
    threads: usize,
    iterations: usize,
    admitted: usize,
    async_admitted: usize,
    timeouts: usize,
    queue_full: usize,
    max_concurrency: usize,
    elapsed_ms: u64,
}

impl fmt::Display for StressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} threads x {} iterations in {}ms",
            self.threads, self.iterations, self.elapsed_ms
        )?;
        writeln!(f, "  admitted:        {}", self.admitted)?;
        writeln!(f, "  async admitted:  {}", self.async_admitted)?;
        writeln!(f, "  timeouts:        {}", self.timeouts)?;
        writeln!(f, "  queue full:      {}", self.queue_full)?;
        writeln!(f, "  max concurrency: {}", self.max_concurrency)
    }
}

#[derive(Default)]
struct Counters {
    admitted: AtomicUsize,
    async_admitted: AtomicUsize,
    timeouts: AtomicUsize,
    queue_full: AtomicUsize,
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

impl Counters {
    /// Count a busy result; anything else is a real failure
    fn busy(&self, err: JobError) -> anyhow::Result<()> {
        match err {
            JobError::Timeout { .. } => self.timeouts.fetch_add(1, Ordering::Relaxed),
            JobError::QueueFull { .. } => self.queue_full.fetch_add(1, Ordering::Relaxed),
            other => return Err(other.into()),
        };
        Ok(())
    }
}

pub fn handle(args: StressArgs) -> anyhow::Result<()> {
    if args.threads == 0 {
        anyhow::bail!("--threads must be at least 1");
    }

    let config = CoordinatorConfig::default()
        .with_async_allowed(args.with_async)
        .with_wait_limit(args.wait_limit);
    let coord = Coordinator::new(config);
    let counters = Counters::default();
    let started = Instant::now();

    thread::scope(|s| -> anyhow::Result<()> {
        let mut handles = Vec::new();
        for worker in 0..args.threads {
            let job_type = if args.with_async && worker % 2 == 0 {
                JobType::Query
            } else {
                JobType::Modify
            };
            let (coord, counters) = (&coord, &counters);
            handles.push(s.spawn(move || sync_worker(coord, counters, job_type, args.iterations)));
        }
        if args.with_async {
            let (coord, counters) = (&coord, &counters);
            handles.push(s.spawn(move || async_driver(coord, counters, args.iterations)));
        }

        for handle in handles {
            handle.join().map_err(|_| anyhow!("worker thread panicked"))??;
        }
        Ok(())
    })?;

    let report = StressReport {
        threads: args.threads,
        iterations: args.iterations,
        admitted: counters.admitted.load(Ordering::SeqCst),
        async_admitted: counters.async_admitted.load(Ordering::SeqCst),
        timeouts: counters.timeouts.load(Ordering::SeqCst),
        queue_full: counters.queue_full.load(Ordering::SeqCst),
        max_concurrency: counters.max_inside.load(Ordering::SeqCst),
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    output::print(&report, args.format)?;

    if report.max_concurrency > 1 {
        anyhow::bail!(
            "mutual exclusion violated: {} sync jobs ran at once",
            report.max_concurrency
        );
    }
    Ok(())
}

fn sync_worker(
    coord: &Coordinator,
    counters: &Counters,
    job_type: JobType,
    iterations: usize,
) -> anyhow::Result<()> {
    for _ in 0..iterations {
        let guard = match coord.acquire(job_type) {
            Ok(guard) => guard,
            Err(err) => {
                counters.busy(err)?;
                continue;
            }
        };

        let now = counters.inside.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_inside.fetch_max(now, Ordering::SeqCst);
        thread::yield_now();
        counters.inside.fetch_sub(1, Ordering::SeqCst);

        counters.admitted.fetch_add(1, Ordering::SeqCst);
        guard.finish()?;
    }
    Ok(())
}

fn async_driver(coord: &Coordinator, counters: &Counters, iterations: usize) -> anyhow::Result<()> {
    for _ in 0..iterations {
        let guard = match coord.acquire_async(JobType::Modify) {
            Ok(guard) => guard,
            Err(err) => {
                counters.busy(err)?;
                continue;
            }
        };
        counters.async_admitted.fetch_add(1, Ordering::SeqCst);
        if !guard.is_aborted() {
            thread::sleep(Duration::from_millis(1));
        }
        guard.finish()?;
    }
    tracing::debug!(iterations, "async driver done");
    Ok(())
}
