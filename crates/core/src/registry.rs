// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide job registry
//!
//! Maps job ids back to live jobs so a caller holding only an id (for
//! instance one handed out by `suspend_job`) can find the job again. Entries
//! are weak: the registry never keeps a job alive.

use crate::id::JobId;
use crate::job::{Job, WeakJob};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

static REGISTRY: OnceLock<JobRegistry> = OnceLock::new();

/// The registry every [`Job`] registers itself in
pub fn registry() -> &'static JobRegistry {
    REGISTRY.get_or_init(JobRegistry::new)
}

/// Concurrent id to job map
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, WeakJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, WeakJob>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, WeakJob>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a job under its id. Returns false if the id was already present.
    pub fn add(&self, job: &Job) -> bool {
        let id = job.id();
        let mut jobs = self.write();
        if jobs.contains_key(&id) {
            return false;
        }
        jobs.insert(id, job.downgrade());
        tracing::debug!(job = %id, registered = jobs.len(), "job registered");
        true
    }

    /// Drop the entry for `id`. Returns false if there was none.
    pub fn remove(&self, id: JobId) -> bool {
        let removed = self.write().remove(&id);
        match removed {
            Some(_) => {
                tracing::debug!(job = %id, "job unregistered");
                true
            }
            None => {
                tracing::debug!(job = %id, "unregister of unknown job ignored");
                false
            }
        }
    }

    pub fn lookup(&self, id: JobId) -> Option<Job> {
        self.read().get(&id).and_then(WeakJob::upgrade)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
