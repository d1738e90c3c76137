// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped job admission
//!
//! A [`JobGuard`] holds a slot of a [`Coordinator`] and ends its job when
//! dropped, so a driver cannot leave a resource locked on an early return.

use super::coordinator::{Admission, Coordinator};
use crate::error::JobError;
use crate::id::JobId;
use crate::job::{Job, JobType};

/// An admitted job that ends when the guard goes out of scope
///
/// The guard only ever ends the cycle it was admitted for. Once that cycle
/// is ended or suspended some other way, finishing or dropping the guard
/// leaves the slot alone.
#[must_use = "dropping the guard ends the job immediately"]
pub struct JobGuard<'a> {
    coordinator: &'a Coordinator,
    admission: Admission,
    armed: bool,
}

impl Coordinator {
    /// [`begin_job`](Self::begin_job), returning a guard that ends the job
    pub fn acquire(&self, job_type: JobType) -> Result<JobGuard<'_>, JobError> {
        Ok(JobGuard::new(self, self.admit(job_type)?))
    }

    /// [`begin_async_job`](Self::begin_async_job), returning a guard that
    /// ends the async job
    pub fn acquire_async(&self, job_type: JobType) -> Result<JobGuard<'_>, JobError> {
        Ok(JobGuard::new(self, self.admit_async(job_type)?))
    }
}

impl<'a> JobGuard<'a> {
    fn new(coordinator: &'a Coordinator, admission: Admission) -> Self {
        Self {
            coordinator,
            admission,
            armed: true,
        }
    }

    pub fn id(&self) -> JobId {
        self.admission.id
    }

    pub fn job(&self) -> &Job {
        &self.admission.job
    }

    /// Whether someone asked this job to stop
    pub fn is_aborted(&self) -> bool {
        self.admission.job.check_abort()
    }

    /// End the job now and report any failure
    pub fn finish(mut self) -> Result<JobId, JobError> {
        self.armed = false;
        self.coordinator.end_owned(&self.admission)
    }

    /// Suspend the job through the coordinator and give up the guard.
    ///
    /// Only sync jobs can be suspended; on failure the guard is dropped and
    /// the job ends.
    pub fn suspend(mut self) -> Result<JobId, JobError> {
        let id = self.coordinator.suspend_owned(&self.admission)?;
        self.armed = false;
        Ok(id)
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.coordinator.end_owned(&self.admission) {
            tracing::warn!(job = %self.admission.id, error = %err, "failed to end job on guard drop");
        }
    }
}

impl std::fmt::Debug for JobGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobGuard")
            .field("id", &self.admission.id)
            .field("cycle", &self.admission.cycle)
            .field("armed", &self.armed)
            .finish()
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
