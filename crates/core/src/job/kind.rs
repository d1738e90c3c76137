// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job types and admission masks

use serde::{Deserialize, Serialize};

/// Kind of work a job performs, ordered by increasing exclusivity
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// No job
    #[default]
    None,
    /// Read-only, safe beside a background job
    Query,
    /// Read-only, but may touch state a background job is changing
    QueryUnsafe,
    /// Changes resource state
    Modify,
    /// Changes resource state and must not be interleaved with other modifications
    ModifyAtomic,
    /// Changes resource state and excludes everything else
    ModifyExclusive,
    /// Destroys the resource
    Destroy,
    /// Destroys the resource regardless of any admission mask
    ForceDestroy,
}

impl JobType {
    pub const ALL: [JobType; 8] = [
        JobType::None,
        JobType::Query,
        JobType::QueryUnsafe,
        JobType::Modify,
        JobType::ModifyAtomic,
        JobType::ModifyExclusive,
        JobType::Destroy,
        JobType::ForceDestroy,
    ];

    /// Mask bit for this type; `None` has no bit
    pub fn bit(self) -> u32 {
        match self {
            JobType::None => 0,
            other => 1 << (other as u32 - 1),
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, JobType::Query | JobType::QueryUnsafe)
    }
}

/// Set of job types permitted to begin while an async job is active
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JobMask(u32);

impl JobMask {
    /// Denies every type (except `ForceDestroy`, which no mask can block)
    pub const NONE: JobMask = JobMask(0);

    pub fn all() -> Self {
        JobType::ALL.into_iter().collect()
    }

    /// Conservative policy for async jobs: only plain queries run alongside
    pub fn read_only() -> Self {
        JobMask(JobType::Query.bit())
    }

    pub fn with(mut self, job_type: JobType) -> Self {
        self.0 |= job_type.bit();
        self
    }

    pub fn without(mut self, job_type: JobType) -> Self {
        self.0 &= !job_type.bit();
        self
    }

    /// Whether the type is explicitly listed in the mask
    pub fn contains(self, job_type: JobType) -> bool {
        job_type != JobType::None && self.0 & job_type.bit() != 0
    }

    /// Whether a job of this type may be admitted under the mask
    pub fn permits(self, job_type: JobType) -> bool {
        job_type == JobType::ForceDestroy || self.contains(job_type)
    }

    pub fn types(self) -> Vec<JobType> {
        JobType::ALL
            .into_iter()
            .filter(|t| self.contains(*t))
            .collect()
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl FromIterator<JobType> for JobMask {
    fn from_iter<I: IntoIterator<Item = JobType>>(iter: I) -> Self {
        iter.into_iter().fold(JobMask::NONE, JobMask::with)
    }
}

impl std::fmt::Debug for JobMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.types()).finish()
    }
}
