// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource job coordinator
//!
//! Serializes work on one resource. The coordinator owns a sync slot, which
//! admits one job at a time, and an optional async slot for a long-running
//! background job. While the async job is active an admission mask decides
//! which sync job types may still begin beside it.
//!
//! Every slot change happens under the coordinator lock, and every blocking
//! admission passes that same lock into [`Job::wait_on`], so no wakeup is lost
//! between checking a slot and going to sleep on it.

use super::config::CoordinatorConfig;
use crate::clock::{Clock, SystemClock};
use crate::error::JobError;
use crate::id::JobId;
use crate::job::{
    BeginOutcome, Job, JobMask, JobOutcome, JobSnapshot, JobType, ResourceRef, ResumeOutcome,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

struct Slots {
    current: Job,
    async_job: Option<Job>,
    mask: JobMask,
    queued: usize,
    max_queued: Option<usize>,
    wait_limit: Duration,
    /// Jobs detached by `suspend_job`, waiting for `resume_job`
    suspended: HashMap<JobId, Job>,
}

impl Slots {
    /// Deadline for one admission, computed once at entry
    fn deadline(&self) -> Option<Instant> {
        if self.wait_limit.is_zero() {
            return None;
        }
        Instant::now().checked_add(self.wait_limit)
    }

    /// The async job, if it is active and its mask keeps `job_type` out
    fn blocking_async(&self, job_type: JobType) -> Option<Job> {
        self.async_job
            .as_ref()
            .filter(|job| job.is_active() && !self.mask.permits(job_type))
            .cloned()
    }

    /// Whatever currently stands between a sync job of `job_type` and admission
    fn sync_blocker(&self, job_type: JobType) -> Option<Job> {
        if self.current.is_active() {
            return Some(self.current.clone());
        }
        self.blocking_async(job_type)
    }
}

/// One admitted cycle of a slot job
pub(crate) struct Admission {
    pub(crate) id: JobId,
    pub(crate) job: Job,
    pub(crate) cycle: u64,
}

impl Admission {
    fn new(id: JobId, job: &Job) -> Self {
        Self {
            id,
            job: job.clone(),
            cycle: job.cycle(),
        }
    }

    /// Whether `slot` is still running this cycle
    fn holds(&self, slot: &Job) -> bool {
        slot.ptr_eq(&self.job) && slot.cycle() == self.cycle
    }
}

/// Diagnostic view of a coordinator
#[derive(Clone, Debug, Serialize)]
pub struct CoordinatorSnapshot {
    pub resource: Option<ResourceRef>,
    pub current: JobSnapshot,
    pub async_job: Option<JobSnapshot>,
    pub mask: Vec<JobType>,
    pub queued: usize,
    pub max_queued_jobs: Option<usize>,
    #[serde(with = "humantime_serde")]
    pub wait_limit: Duration,
    pub suspended: Vec<JobId>,
}

/// Admission control for one resource
pub struct Coordinator {
    resource: Option<ResourceRef>,
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
    slots: Mutex<Slots>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::build(None, config, Arc::new(SystemClock))
    }

    pub fn for_resource(resource: ResourceRef, config: CoordinatorConfig) -> Self {
        Self::build(Some(resource), config, Arc::new(SystemClock))
    }

    /// Rebuild the coordinator's jobs on another time source
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self::build(self.resource, self.config, clock)
    }

    fn build(
        resource: Option<ResourceRef>,
        config: CoordinatorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let current = new_slot_job(&clock, &resource);
        let async_job = config
            .async_allowed
            .then(|| new_slot_job(&clock, &resource));
        let slots = Slots {
            current,
            async_job,
            mask: JobMask::NONE,
            queued: 0,
            max_queued: queue_bound(config.max_queued_jobs),
            wait_limit: config.wait_limit,
            suspended: HashMap::new(),
        };
        Self {
            resource,
            config,
            clock,
            slots: Mutex::new(slots),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn label(&self) -> String {
        match &self.resource {
            Some(resource) => resource.to_string(),
            None => "unnamed resource".to_string(),
        }
    }

    /// Park on `job` until it goes inactive, counting against the queue bound
    fn wait_for<'a>(
        &self,
        mut slots: MutexGuard<'a, Slots>,
        job: &Job,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'a, Slots>, JobError> {
        if let Some(limit) = slots.max_queued {
            if slots.queued >= limit {
                tracing::warn!(resource = %self.label(), limit, "admission queue full");
                return Err(JobError::QueueFull { limit });
            }
        }

        slots.queued += 1;
        let (mut slots, result) = job.wait_on(slots, deadline);
        slots.queued = slots.queued.saturating_sub(1);

        if let Err(err) = &result {
            tracing::warn!(
                resource = %self.label(),
                blocker = %job.id(),
                error = %err,
                "admission wait failed"
            );
        }
        result.map(|()| slots)
    }

    /// Admit a sync job, blocking until the slot is free and the mask allows it
    pub fn begin_job(&self, job_type: JobType) -> Result<JobId, JobError> {
        self.admit(job_type).map(|admission| admission.id)
    }

    pub(crate) fn admit(&self, job_type: JobType) -> Result<Admission, JobError> {
        if job_type == JobType::None {
            return Err(JobError::InvalidJobType(job_type));
        }

        let mut slots = self.lock();
        let deadline = slots.deadline();
        loop {
            match slots.sync_blocker(job_type) {
                Some(blocker) => slots = self.wait_for(slots, &blocker, deadline)?,
                None => match slots.current.begin(job_type)? {
                    BeginOutcome::Admitted(id) => return Ok(Admission::new(id, &slots.current)),
                    BeginOutcome::AlreadyActive => continue,
                },
            }
        }
    }

    /// Admit the async job once neither slot is busy, then install the
    /// configured mask
    pub fn begin_async_job(&self, job_type: JobType) -> Result<JobId, JobError> {
        self.admit_async(job_type).map(|admission| admission.id)
    }

    pub(crate) fn admit_async(&self, job_type: JobType) -> Result<Admission, JobError> {
        if job_type == JobType::None {
            return Err(JobError::InvalidJobType(job_type));
        }

        let mut slots = self.lock();
        let async_job = slots
            .async_job
            .clone()
            .ok_or_else(|| JobError::AsyncNotAllowed(self.label()))?;
        let deadline = slots.deadline();
        loop {
            let blocker = if async_job.is_active() {
                Some(async_job.clone())
            } else if slots.current.is_active() {
                Some(slots.current.clone())
            } else {
                None
            };
            match blocker {
                Some(blocker) => slots = self.wait_for(slots, &blocker, deadline)?,
                None => match async_job.begin(job_type)? {
                    BeginOutcome::Admitted(id) => {
                        slots.mask = self.config.async_mask();
                        tracing::debug!(job = %id, mask = ?slots.mask, "async job admitted");
                        return Ok(Admission::new(id, &async_job));
                    }
                    BeginOutcome::AlreadyActive => continue,
                },
            }
        }
    }

    pub fn end_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        Self::end_current(slots)
    }

    pub fn end_async_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        self.end_async(slots)
    }

    fn end_current(slots: MutexGuard<'_, Slots>) -> Result<JobId, JobError> {
        let id = slots.current.end()?;
        slots.current.signal(true);
        Ok(id)
    }

    fn end_async(&self, mut slots: MutexGuard<'_, Slots>) -> Result<JobId, JobError> {
        let job = slots
            .async_job
            .clone()
            .ok_or_else(|| JobError::AsyncNotAllowed(self.label()))?;
        let id = job.end()?;
        slots.mask = JobMask::NONE;
        job.signal(true);
        Ok(id)
    }

    /// End the admitted cycle if it still occupies one of the slots
    pub(crate) fn end_owned(&self, admission: &Admission) -> Result<JobId, JobError> {
        let slots = self.lock();
        if admission.holds(&slots.current) {
            return Self::end_current(slots);
        }
        if slots.async_job.as_ref().is_some_and(|a| admission.holds(a)) {
            return self.end_async(slots);
        }
        Err(JobError::NotActive {
            id: admission.id,
            op: "end",
        })
    }

    /// Record how the sync job finished and free the slot, keeping its type
    /// and start time visible until the next admission
    pub fn conclude_job(&self, outcome: JobOutcome) -> Result<JobId, JobError> {
        let slots = self.lock();
        slots.current.conclude(outcome)
    }

    /// Record how the async job finished and lift its mask
    pub fn conclude_async_job(&self, outcome: JobOutcome) -> Result<JobId, JobError> {
        let mut slots = self.lock();
        let job = slots
            .async_job
            .clone()
            .ok_or_else(|| JobError::AsyncNotAllowed(self.label()))?;
        let id = job.conclude(outcome)?;
        slots.mask = JobMask::NONE;
        Ok(id)
    }

    /// Ask the async job to stop; its driver polls [`check_async_abort`](Self::check_async_abort)
    pub fn abort_async_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        let job = slots
            .async_job
            .as_ref()
            .ok_or_else(|| JobError::AsyncNotAllowed(self.label()))?;
        job.abort()
    }

    /// Ask the current sync job to stop and wake everything parked on it
    pub fn abort_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        slots.current.abort_and_signal()
    }

    pub fn check_async_abort(&self) -> bool {
        let slots = self.lock();
        slots.async_job.as_ref().is_some_and(Job::check_abort)
    }

    /// Detach the active sync job so other work can run, returning the id to
    /// pass to [`resume_job`](Self::resume_job)
    pub fn suspend_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        self.suspend_current(slots)
    }

    pub(crate) fn suspend_owned(&self, admission: &Admission) -> Result<JobId, JobError> {
        let slots = self.lock();
        if !admission.holds(&slots.current) {
            return Err(JobError::NotActive {
                id: admission.id,
                op: "suspend",
            });
        }
        self.suspend_current(slots)
    }

    fn suspend_current(&self, mut slots: MutexGuard<'_, Slots>) -> Result<JobId, JobError> {
        if !slots.current.is_active() {
            return Err(JobError::NotActive {
                id: slots.current.id(),
                op: "suspend",
            });
        }

        // Build the replacement before touching the current job so a failure
        // leaves the slot as it was
        let fresh = new_slot_job(&self.clock, &self.resource);
        let id = slots.current.suspend()?;
        let detached = std::mem::replace(&mut slots.current, fresh);

        // Waiters parked on the detached job must re-check the fresh slot
        detached.signal(true);
        slots.suspended.insert(id, detached);

        tracing::debug!(job = %id, resource = %self.label(), "job suspended");
        Ok(id)
    }

    /// Wait for admission on behalf of a suspended job and make it current again
    pub fn resume_job(&self, id: JobId) -> Result<ResumeOutcome, JobError> {
        let job = Job::from_id(id)?;
        let mut slots = self.lock();
        let job_type = job.job_type();
        let deadline = slots.deadline();
        loop {
            // Another thread may have resumed it while we slept
            if !slots.suspended.get(&id).is_some_and(|s| s.ptr_eq(&job)) {
                return Err(JobError::InvalidJobId(id));
            }
            match slots.sync_blocker(job_type) {
                Some(blocker) => slots = self.wait_for(slots, &blocker, deadline)?,
                None => break,
            }
        }

        match job.resume_if_not_aborted()? {
            ResumeOutcome::Aborted => {
                slots.suspended.remove(&id);
                drop(slots);
                tracing::info!(job = %id, "suspended job was aborted, discarding");
                job.free();
                Ok(ResumeOutcome::Aborted)
            }
            ResumeOutcome::Resumed(id) => {
                slots.suspended.remove(&id);
                let replaced = std::mem::replace(&mut slots.current, job);
                drop(slots);
                replaced.free();
                Ok(ResumeOutcome::Resumed(id))
            }
        }
    }

    /// Hand the active sync job to another thread
    pub fn transfer_job(&self, owner: ThreadId) -> Result<JobId, JobError> {
        let slots = self.lock();
        if !slots.current.is_active() {
            return Err(JobError::NotActive {
                id: slots.current.id(),
                op: "transfer",
            });
        }
        slots.current.change_owner(Some(owner));
        Ok(slots.current.id())
    }

    /// Clear the owner of the active async job so a monitor thread can drive it
    pub fn disown_async_job(&self) -> Result<JobId, JobError> {
        let slots = self.lock();
        let job = slots
            .async_job
            .as_ref()
            .ok_or_else(|| JobError::AsyncNotAllowed(self.label()))?;
        if !job.is_active() {
            return Err(JobError::NotActive {
                id: job.id(),
                op: "disown",
            });
        }
        job.change_owner(None);
        Ok(job.id())
    }

    /// Replace the admission mask; waiters blocked by the old mask re-check
    pub fn set_job_mask(&self, mask: JobMask) {
        let mut slots = self.lock();
        slots.mask = mask;
        if let Some(job) = &slots.async_job {
            job.signal(true);
        }
    }

    pub fn job_mask(&self) -> JobMask {
        self.lock().mask
    }

    /// Whether `begin_job(job_type)` would be admitted right now
    pub fn job_allowed(&self, job_type: JobType) -> bool {
        self.lock().sync_blocker(job_type).is_none()
    }

    pub fn set_wait_limit(&self, limit: Duration) {
        self.lock().wait_limit = limit;
    }

    pub fn wait_limit(&self) -> Duration {
        self.lock().wait_limit
    }

    /// `None` or zero lifts the bound
    pub fn set_max_queued_jobs(&self, max: Option<usize>) {
        self.lock().max_queued = queue_bound(max);
    }

    /// Threads currently blocked waiting for admission
    pub fn queued(&self) -> usize {
        self.lock().queued
    }

    /// The sync slot's job, for inspection. Change its state through the
    /// coordinator, never through the handle.
    pub fn current_job(&self) -> Job {
        self.lock().current.clone()
    }

    pub fn async_job(&self) -> Option<Job> {
        self.lock().async_job.clone()
    }

    pub fn suspended_jobs(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.lock().suspended.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn resource(&self) -> Option<&ResourceRef> {
        self.resource.as_ref()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let slots = self.lock();
        let mut suspended: Vec<JobId> = slots.suspended.keys().copied().collect();
        suspended.sort();
        CoordinatorSnapshot {
            resource: self.resource.clone(),
            current: slots.current.snapshot(),
            async_job: slots.async_job.as_ref().map(Job::snapshot),
            mask: slots.mask.types(),
            queued: slots.queued,
            max_queued_jobs: slots.max_queued,
            wait_limit: slots.wait_limit,
            suspended,
        }
    }
}

/// Zero is the conventional spelling of "unbounded"
fn queue_bound(max: Option<usize>) -> Option<usize> {
    max.filter(|&max| max > 0)
}

fn new_slot_job(clock: &Arc<dyn Clock>, resource: &Option<ResourceRef>) -> Job {
    let job = Job::with_clock(Arc::clone(clock));
    job.set_resource(resource.clone());
    job
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("resource", &self.resource)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
