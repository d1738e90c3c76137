// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifiers
//!
//! Ids come from one process-wide counter. Zero is reserved: it marks a job
//! that was never initialized or has been cleaned up.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique job identifier
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// The reserved id carried by uninitialized jobs
    pub const INVALID: JobId = JobId(0);

    /// Allocate the next id from the process-wide counter
    pub fn next() -> Self {
        loop {
            let n = NEXT_JOB_ID.fetch_add(1, Ordering::SeqCst);
            // wrapped around
            if n != 0 {
                return JobId(n);
            }
        }
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn next_ids_are_valid_and_increasing() {
        let id1 = JobId::next();
        let id2 = JobId::next();
        assert!(id1.is_valid());
        assert!(id2.is_valid());
        assert!(id2 > id1);
    }

    #[test]
    fn invalid_id_is_zero() {
        assert!(!JobId::INVALID.is_valid());
        assert_eq!(JobId::default(), JobId::INVALID);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| JobId::next()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 800);
    }

    #[test]
    fn id_displays_as_number() {
        assert_eq!(JobId(17).to_string(), "17");
    }
}
