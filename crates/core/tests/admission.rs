// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Integration tests for job admission
//!
//! Drives coordinators from several threads the way resource drivers do.

use jobctl_core::{
    registry, Coordinator, CoordinatorConfig, Job, JobError, JobMask, JobType, ResourceRef,
    ResumeOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[test]
fn async_job_with_query_beside_it_and_modify_after_it() {
    let config = CoordinatorConfig::default()
        .with_async_allowed(true)
        .with_max_queued_jobs(Some(5))
        .with_wait_limit(Duration::from_millis(1000));
    let coord = Coordinator::for_resource(ResourceRef::Domain("guest".into()), config);
    let async_ended = AtomicBool::new(false);

    // A: background modification with the default {Query} mask
    let a = coord.begin_async_job(JobType::Modify).unwrap();
    assert_eq!(coord.job_mask(), JobMask::read_only());

    thread::scope(|s| {
        // B: a query is admitted immediately
        let b = s
            .spawn(|| {
                let id = coord.begin_job(JobType::Query).unwrap();
                coord.end_job().unwrap();
                id
            })
            .join()
            .unwrap();
        assert_ne!(a, b);

        // C: a modification must wait for A
        let c = s.spawn(|| {
            let id = coord.begin_job(JobType::Modify).unwrap();
            assert!(async_ended.load(Ordering::SeqCst));
            coord.end_job().unwrap();
            id
        });
        wait_until("C to queue", || coord.queued() == 1);
        thread::sleep(Duration::from_millis(50));
        assert!(!c.is_finished());

        async_ended.store(true, Ordering::SeqCst);
        coord.end_async_job().unwrap();

        // B and C share the sync slot's job
        assert_eq!(c.join().unwrap(), b);
    });

    assert_eq!(coord.job_mask(), JobMask::NONE);
    assert!(coord.job_allowed(JobType::Destroy));
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn wait_deadline_fires_while_holder_still_runs() {
    let job = Job::new();
    job.begin(JobType::Modify).unwrap();

    let holder = job.clone();
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        holder.end().unwrap();
    });

    let started = Instant::now();
    let err = job
        .wait(Some(started + Duration::from_millis(50)))
        .unwrap_err();
    let waited = started.elapsed();

    assert!(err.is_timeout());
    assert!(waited >= Duration::from_millis(50));
    assert!(waited < Duration::from_millis(200), "waited {waited:?}");
    worker.join().unwrap();
    assert!(!job.is_active());
}

// =============================================================================
// Multiple resources
// =============================================================================

#[test]
fn coordinators_for_different_resources_are_independent() {
    let config = CoordinatorConfig::default().with_wait_limit(Duration::from_millis(50));
    let vm = Coordinator::for_resource(ResourceRef::Domain("vm".into()), config.clone());
    let pool = Coordinator::for_resource(ResourceRef::StoragePool("images".into()), config);

    vm.begin_job(JobType::Destroy).unwrap();
    pool.begin_job(JobType::Modify).unwrap();

    assert!(vm.begin_job(JobType::Query).unwrap_err().is_busy());
    vm.end_job().unwrap();
    pool.end_job().unwrap();
}

// =============================================================================
// Suspend across threads
// =============================================================================

#[test]
fn job_suspended_on_one_thread_resumes_on_another() {
    let coord = Coordinator::new(CoordinatorConfig::default());
    let id = coord.begin_job(JobType::ModifyExclusive).unwrap();
    coord.suspend_job().unwrap();

    // The id alone is enough to find the job again
    assert!(registry().contains(id));
    assert!(Job::from_id(id).unwrap().is_suspended());

    let resumer = thread::scope(|s| {
        s.spawn(|| {
            assert_eq!(coord.resume_job(id).unwrap(), ResumeOutcome::Resumed(id));
            thread::current().id()
        })
        .join()
        .unwrap()
    });

    let current = coord.current_job();
    assert_eq!(current.id(), id);
    assert_eq!(current.owner(), Some(resumer));
    coord.end_job().unwrap();
}

#[test]
fn concurrent_resumes_admit_exactly_one() {
    let coord = Coordinator::new(CoordinatorConfig::default().with_wait_limit(Duration::ZERO));
    let id = coord.begin_job(JobType::Modify).unwrap();
    coord.suspend_job().unwrap();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| coord.resume_job(id))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let resumed = results
        .iter()
        .filter(|r| **r == Ok(ResumeOutcome::Resumed(id)))
        .count();
    let rejected = results
        .iter()
        .filter(|r| **r == Err(JobError::InvalidJobId(id)))
        .count();
    assert_eq!(resumed, 1);
    assert_eq!(rejected, 3);
}
