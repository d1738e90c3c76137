// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job synchronization primitive
//!
//! A [`Job`] is a cloneable handle to shared job state: type, status flags,
//! owner thread, start timestamp and an opaque payload, plus the mutex and
//! condition variable that threads block on while the job is active.
//!
//! Status flags are written under the job's own lock and mirrored in an
//! atomic so `is_active`/`check_abort` never block.
//!
//! Jobs held in a coordinator slot must only change state through the
//! coordinator; calling the mutators below on them directly bypasses the
//! lock its waiters sleep under.

use super::kind::JobType;
use super::resource::ResourceRef;
use super::status::JobStatus;
use crate::clock::{Clock, SystemClock};
use crate::error::JobError;
use crate::id::JobId;
use crate::registry::registry;
use serde::Serialize;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Result of [`Job::begin`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeginOutcome {
    /// The caller now owns the job
    Admitted(JobId),
    /// The job was already active; nothing changed
    AlreadyActive,
}

impl BeginOutcome {
    pub fn is_admitted(self) -> bool {
        matches!(self, BeginOutcome::Admitted(_))
    }
}

/// Result of resuming a suspended job
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed(JobId),
    /// The job was aborted while suspended and must not be resumed
    Aborted,
}

/// How a job finished, for [`Job::conclude`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
}

/// Point-in-time view of a job, for diagnostics
#[derive(Clone, Debug, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub owner: Option<String>,
    pub started_at_ms: Option<u64>,
    pub waiters: usize,
    pub resource: Option<ResourceRef>,
}

#[derive(Default)]
struct JobFields {
    job_type: JobType,
    owner: Option<ThreadId>,
    /// Milliseconds since the epoch
    start: Option<u64>,
    resource: Option<ResourceRef>,
    private_data: Option<Box<dyn Any + Send>>,
}

struct JobCore {
    id: AtomicU64,
    status: AtomicU8,
    waiters: AtomicUsize,
    max_waiters: AtomicUsize,
    /// Bumped each time the job becomes active
    cycle: AtomicU64,
    registered: AtomicBool,
    fields: Mutex<JobFields>,
    cond: Condvar,
    clock: Arc<dyn Clock>,
}

impl JobCore {
    fn id(&self) -> JobId {
        JobId(self.id.load(Ordering::SeqCst))
    }

    fn status(&self) -> JobStatus {
        JobStatus::from_bits(self.status.load(Ordering::Acquire))
    }

    /// Caller must hold `fields`
    fn store_status(&self, status: JobStatus) {
        self.status.store(status.bits(), Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, JobFields> {
        self.fields.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release_waiter(&self) {
        // The counter may have been zeroed by a reset while we slept
        let _ = self
            .waiters
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| {
                Some(w.saturating_sub(1))
            });
    }

    fn unregister(&self) {
        if self.registered.swap(false, Ordering::SeqCst) {
            registry().remove(self.id());
        }
    }
}

impl Drop for JobCore {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Handle to a job; clones share the same job
#[derive(Clone)]
pub struct Job {
    core: Arc<JobCore>,
}

/// Registry-side back-reference that does not keep the job alive
pub(crate) struct WeakJob(Weak<JobCore>);

impl WeakJob {
    pub(crate) fn upgrade(&self) -> Option<Job> {
        self.0.upgrade().map(|core| Job { core })
    }
}

impl Job {
    /// Create and register a job that reads time from the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let job = Job {
            core: Arc::new(JobCore {
                id: AtomicU64::new(0),
                status: AtomicU8::new(JobStatus::empty().bits()),
                waiters: AtomicUsize::new(0),
                max_waiters: AtomicUsize::new(usize::MAX),
                cycle: AtomicU64::new(0),
                registered: AtomicBool::new(false),
                fields: Mutex::new(JobFields::default()),
                cond: Condvar::new(),
                clock,
            }),
        };
        job.init();
        job
    }

    /// Look up a live job by id in the process-wide registry
    pub fn from_id(id: JobId) -> Result<Job, JobError> {
        registry().lookup(id).ok_or(JobError::InvalidJobId(id))
    }

    /// Assign an id and register the job.
    ///
    /// A no-op returning the current id when the job is already initialized;
    /// after [`cleanup`](Self::cleanup) it assigns a fresh id.
    pub fn init(&self) -> JobId {
        let current = self.core.id();
        if current.is_valid() {
            return current;
        }

        let id = JobId::next();
        {
            let _fields = self.core.lock();
            self.core.id.store(id.0, Ordering::SeqCst);
            self.core.max_waiters.store(usize::MAX, Ordering::SeqCst);
            self.core.store_status(JobStatus::IDLE);
        }
        registry().add(self);
        self.core.registered.store(true, Ordering::SeqCst);
        tracing::debug!(job = %id, "job initialized");
        id
    }

    pub fn id(&self) -> JobId {
        self.core.id()
    }

    /// Start a cycle of the job on behalf of the calling thread
    pub fn begin(&self, job_type: JobType) -> Result<BeginOutcome, JobError> {
        let mut fields = self.core.lock();
        let id = self.core.id();
        if !id.is_valid() {
            return Err(JobError::Uninitialized);
        }
        if job_type == JobType::None {
            return Err(JobError::InvalidJobType(job_type));
        }

        let mut status = self.core.status();
        if status.contains(JobStatus::ACTIVE) {
            return Ok(BeginOutcome::AlreadyActive);
        }
        if status.contains(JobStatus::SUSPENDED) {
            return Err(JobError::Suspended { id });
        }

        let now = self.core.clock.epoch_millis()?;
        fields.start = Some(now);
        fields.owner = Some(thread::current().id());
        fields.job_type = job_type;
        status.remove(
            JobStatus::IDLE | JobStatus::COMPLETED | JobStatus::FAILED | JobStatus::ABORTED,
        );
        status.insert(JobStatus::ACTIVE);
        self.core.store_status(status);
        self.core.cycle.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(job = %id, ?job_type, "job began");
        Ok(BeginOutcome::Admitted(id))
    }

    /// Finish the current cycle and wake one waiter
    pub fn end(&self) -> Result<JobId, JobError> {
        let mut fields = self.core.lock();
        let id = self.core.id();
        if fields.job_type == JobType::None {
            return Err(JobError::NotActive { id, op: "end" });
        }
        self.reset_locked(&mut fields);
        drop(fields);

        self.core.cond.notify_one();
        tracing::debug!(job = %id, "job ended");
        Ok(id)
    }

    /// Clear type, flags, owner and waiter count; identity is kept
    pub fn reset(&self) -> JobId {
        let mut fields = self.core.lock();
        self.reset_locked(&mut fields);
        self.core.id()
    }

    fn reset_locked(&self, fields: &mut JobFields) {
        fields.job_type = JobType::None;
        fields.owner = None;
        fields.start = None;
        self.core.waiters.store(0, Ordering::SeqCst);
        self.core.store_status(JobStatus::IDLE);
    }

    /// Flag the job as aborted; the running thread is expected to poll
    /// [`check_abort`](Self::check_abort)
    pub fn abort(&self) -> Result<JobId, JobError> {
        let _fields = self.core.lock();
        let id = self.core.id();
        let mut status = self.core.status();
        if !status.intersects(JobStatus::ACTIVE | JobStatus::SUSPENDED) {
            return Err(JobError::NotRunning { id, op: "abort" });
        }
        status.insert(JobStatus::ABORTED);
        self.core.store_status(status);

        tracing::debug!(job = %id, "job abort requested");
        Ok(id)
    }

    /// Abort and wake every waiter so blocked callers re-evaluate now
    pub fn abort_and_signal(&self) -> Result<JobId, JobError> {
        let id = self.abort()?;
        self.core.cond.notify_all();
        Ok(id)
    }

    pub fn suspend(&self) -> Result<JobId, JobError> {
        let _fields = self.core.lock();
        let id = self.core.id();
        let mut status = self.core.status();
        if !status.contains(JobStatus::ACTIVE) {
            return Err(JobError::NotActive { id, op: "suspend" });
        }
        status.remove(JobStatus::ACTIVE);
        status.insert(JobStatus::SUSPENDED);
        self.core.store_status(status);

        tracing::debug!(job = %id, "job suspended");
        Ok(id)
    }

    /// Make a suspended job active again, owned by the calling thread
    pub fn resume(&self) -> Result<JobId, JobError> {
        let mut fields = self.core.lock();
        let id = self.core.id();
        let status = self.core.status();
        if !status.contains(JobStatus::SUSPENDED) {
            return Err(JobError::NotSuspended { id });
        }
        self.resume_locked(&mut fields, status);
        Ok(id)
    }

    /// Like [`resume`](Self::resume), but leaves an aborted job untouched
    pub fn resume_if_not_aborted(&self) -> Result<ResumeOutcome, JobError> {
        let mut fields = self.core.lock();
        let id = self.core.id();
        let status = self.core.status();
        if !status.contains(JobStatus::SUSPENDED) {
            return Err(JobError::NotSuspended { id });
        }
        if status.contains(JobStatus::ABORTED) {
            return Ok(ResumeOutcome::Aborted);
        }
        self.resume_locked(&mut fields, status);
        Ok(ResumeOutcome::Resumed(id))
    }

    fn resume_locked(&self, fields: &mut JobFields, mut status: JobStatus) {
        status.remove(JobStatus::SUSPENDED);
        status.insert(JobStatus::ACTIVE);
        self.core.store_status(status);
        self.core.cycle.fetch_add(1, Ordering::SeqCst);
        fields.owner = Some(thread::current().id());
        tracing::debug!(job = %self.core.id(), "job resumed");
    }

    /// Mark a running job as finished without cleaning it up.
    ///
    /// Type and start time stay readable until the next `end` or `reset`.
    /// For slot jobs use [`Coordinator::conclude_job`](crate::Coordinator::conclude_job).
    pub fn conclude(&self, outcome: JobOutcome) -> Result<JobId, JobError> {
        let mut fields = self.core.lock();
        let id = self.core.id();
        let mut status = self.core.status();
        if !status.intersects(JobStatus::ACTIVE | JobStatus::SUSPENDED) {
            return Err(JobError::NotRunning { id, op: "conclude" });
        }
        status.remove(JobStatus::ACTIVE | JobStatus::SUSPENDED);
        status.insert(match outcome {
            JobOutcome::Completed => JobStatus::COMPLETED,
            JobOutcome::Failed => JobStatus::FAILED,
        });
        self.core.store_status(status);
        fields.owner = None;
        drop(fields);

        self.core.cond.notify_all();
        tracing::debug!(job = %id, ?outcome, "job concluded");
        Ok(id)
    }

    /// Block while the job is active, using the job's own lock.
    ///
    /// Only for standalone jobs: a job's condition variable must always be
    /// paired with the same mutex, and coordinator-owned jobs are waited on
    /// with the coordinator's lock.
    pub fn wait(&self, deadline: Option<Instant>) -> Result<(), JobError> {
        let fields = self.core.lock();
        let (_fields, result) = self.wait_on(fields, deadline);
        result
    }

    /// Block while the job is active, releasing `guard` while asleep.
    ///
    /// `guard` must be the lock under which every state change of this job
    /// is made, otherwise a wakeup can be lost. The guard is handed back on
    /// every path. `deadline: None` waits indefinitely.
    pub fn wait_on<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        deadline: Option<Instant>,
    ) -> (MutexGuard<'a, T>, Result<(), JobError>) {
        if !self.is_active() {
            return (guard, Ok(()));
        }

        let limit = self.core.max_waiters.load(Ordering::SeqCst);
        let queued = self
            .core
            .waiters
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        if queued > limit {
            self.core.release_waiter();
            return (guard, Err(JobError::QueueFull { limit }));
        }

        let started = Instant::now();
        let mut guard = guard;
        let result = loop {
            if !self.is_active() {
                break Ok(());
            }
            match deadline {
                None => {
                    guard = self
                        .core
                        .cond
                        .wait(guard)
                        .unwrap_or_else(|e| e.into_inner());
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break Err(JobError::Timeout {
                            id: self.id(),
                            waited: now.duration_since(started),
                        });
                    }
                    let (next, _) = self
                        .core
                        .cond
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    guard = next;
                }
            }
        };
        self.core.release_waiter();
        (guard, result)
    }

    /// Wake one waiter, or all of them
    pub fn signal(&self, broadcast: bool) {
        if broadcast {
            self.core.cond.notify_all();
        } else {
            self.core.cond.notify_one();
        }
    }

    pub fn status(&self) -> JobStatus {
        self.core.status()
    }

    /// How many times the job has been begun or resumed.
    ///
    /// Ids outlive cycles, so this tells one holder of a reused job from the
    /// next.
    pub fn cycle(&self) -> u64 {
        self.core.cycle.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.status().contains(JobStatus::ACTIVE)
    }

    pub fn is_suspended(&self) -> bool {
        self.status().contains(JobStatus::SUSPENDED)
    }

    pub fn check_abort(&self) -> bool {
        self.status().contains(JobStatus::ABORTED)
    }

    pub fn job_type(&self) -> JobType {
        self.core.lock().job_type
    }

    /// Reclassify a running job
    pub fn set_job_type(&self, job_type: JobType) -> Result<(), JobError> {
        if job_type == JobType::None {
            return Err(JobError::InvalidJobType(job_type));
        }
        let mut fields = self.core.lock();
        if !self
            .status()
            .intersects(JobStatus::ACTIVE | JobStatus::SUSPENDED)
        {
            return Err(JobError::NotRunning {
                id: self.id(),
                op: "retype",
            });
        }
        fields.job_type = job_type;
        Ok(())
    }

    pub fn owner(&self) -> Option<ThreadId> {
        self.core.lock().owner
    }

    /// Hand the job to another thread. The new owner is not validated.
    pub fn change_owner(&self, owner: Option<ThreadId>) {
        self.core.lock().owner = owner;
    }

    /// Milliseconds since the epoch at which the current cycle began
    pub fn started_at(&self) -> Option<u64> {
        self.core.lock().start
    }

    /// Time since the job began; zero when it is not active
    pub fn elapsed(&self) -> Result<Duration, JobError> {
        let fields = self.core.lock();
        let start = match fields.start {
            Some(start) if self.is_active() => start,
            _ => return Ok(Duration::ZERO),
        };
        let now = self.core.clock.epoch_millis()?;
        Ok(Duration::from_millis(now.saturating_sub(start)))
    }

    /// Number of threads currently blocked in `wait`/`wait_on`
    pub fn waiters(&self) -> usize {
        self.core.waiters.load(Ordering::SeqCst)
    }

    pub fn max_waiters(&self) -> usize {
        self.core.max_waiters.load(Ordering::SeqCst)
    }

    pub fn set_max_waiters(&self, max: usize) {
        self.core.max_waiters.store(max, Ordering::SeqCst);
    }

    pub fn resource(&self) -> Option<ResourceRef> {
        self.core.lock().resource.clone()
    }

    pub fn set_resource(&self, resource: Option<ResourceRef>) {
        self.core.lock().resource = resource;
    }

    /// Attach a caller-owned payload, replacing any previous one
    pub fn set_private_data<T: Any + Send>(&self, data: T) {
        self.core.lock().private_data = Some(Box::new(data));
    }

    /// Run `f` on the payload if one of type `T` is attached
    pub fn with_private_data<T: Any + Send, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut fields = self.core.lock();
        fields
            .private_data
            .as_deref_mut()?
            .downcast_mut::<T>()
            .map(f)
    }

    /// Detach the payload if it has type `T`
    pub fn take_private_data<T: Any + Send>(&self) -> Option<T> {
        let mut fields = self.core.lock();
        let data = fields.private_data.take()?;
        match data.downcast::<T>() {
            Ok(data) => Some(*data),
            Err(other) => {
                fields.private_data = Some(other);
                None
            }
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let fields = self.core.lock();
        JobSnapshot {
            id: self.id(),
            job_type: fields.job_type,
            status: self.status(),
            owner: fields.owner.map(|owner| format!("{owner:?}")),
            started_at_ms: fields.start,
            waiters: self.waiters(),
            resource: fields.resource.clone(),
        }
    }

    /// Whether both handles refer to the same job
    pub fn ptr_eq(&self, other: &Job) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    pub(crate) fn downgrade(&self) -> WeakJob {
        WeakJob(Arc::downgrade(&self.core))
    }

    /// Unregister the job and release this handle
    pub fn free(self) {
        self.core.unregister();
        tracing::debug!(job = %self.id(), "job freed");
    }

    /// Unregister the job and zero it so [`init`](Self::init) can reuse it
    pub fn cleanup(&self) {
        let id = self.id();
        self.core.unregister();
        {
            let mut fields = self.core.lock();
            *fields = JobFields::default();
            self.core.id.store(0, Ordering::SeqCst);
            self.core.waiters.store(0, Ordering::SeqCst);
            self.core.store_status(JobStatus::empty());
        }
        self.core.cond.notify_all();
        tracing::debug!(job = %id, "job cleaned up");
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Job {}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
