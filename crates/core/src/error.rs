// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for job control

use crate::id::JobId;
use crate::job::JobType;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by jobs, the registry and coordinators
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("time source unavailable: {0}")]
    Clock(String),
    #[error("cannot {op} job {id}: job is not active")]
    NotActive { id: JobId, op: &'static str },
    #[error("cannot {op} job {id}: job is neither active nor suspended")]
    NotRunning { id: JobId, op: &'static str },
    #[error("cannot resume job {id}: job is not suspended")]
    NotSuspended { id: JobId },
    #[error("cannot begin job {id}: job is suspended")]
    Suspended { id: JobId },
    #[error("job is not initialized")]
    Uninitialized,
    #[error("cannot begin a job of type {0:?}")]
    InvalidJobType(JobType),
    #[error("timed out after {waited:?} waiting on job {id}")]
    Timeout { id: JobId, waited: Duration },
    #[error("too many waiters queued (limit {limit})")]
    QueueFull { limit: usize },
    #[error("no such job: {0}")]
    InvalidJobId(JobId),
    #[error("async jobs are not allowed on {0}")]
    AsyncNotAllowed(String),
}

impl JobError {
    /// Whether the error means "resource busy, try again later"
    pub fn is_busy(&self) -> bool {
        matches!(self, JobError::Timeout { .. } | JobError::QueueFull { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, JobError::Timeout { .. })
    }
}
