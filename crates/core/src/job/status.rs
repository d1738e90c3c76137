// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status flags

use serde::{Serialize, Serializer};

/// Bit-set of job status flags
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JobStatus(u8);

impl JobStatus {
    pub const IDLE: JobStatus = JobStatus(1 << 0);
    pub const ACTIVE: JobStatus = JobStatus(1 << 1);
    pub const SUSPENDED: JobStatus = JobStatus(1 << 2);
    pub const COMPLETED: JobStatus = JobStatus(1 << 3);
    pub const FAILED: JobStatus = JobStatus(1 << 4);
    pub const ABORTED: JobStatus = JobStatus(1 << 5);

    const NAMES: [(JobStatus, &'static str); 6] = [
        (JobStatus::IDLE, "idle"),
        (JobStatus::ACTIVE, "active"),
        (JobStatus::SUSPENDED, "suspended"),
        (JobStatus::COMPLETED, "completed"),
        (JobStatus::FAILED, "failed"),
        (JobStatus::ABORTED, "aborted"),
    ];

    pub const fn empty() -> Self {
        JobStatus(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        JobStatus(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every flag of `other` is set
    pub const fn contains(self, other: JobStatus) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag of `other` is set
    pub const fn intersects(self, other: JobStatus) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: JobStatus) -> Self {
        JobStatus(self.0 | other.0)
    }

    pub fn insert(&mut self, other: JobStatus) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: JobStatus) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Names of the set flags, lowest bit first
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for JobStatus {
    type Output = JobStatus;

    fn bitor(self, rhs: JobStatus) -> JobStatus {
        self.union(rhs)
    }
}

impl std::fmt::Debug for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JobStatus({})", self.names().join(" | "))
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}
