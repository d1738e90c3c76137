// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling

use crate::error::JobError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides wall-clock time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn epoch_millis(&self) -> Result<u64, JobError>;
}

/// Real system clock
#[derive(Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_millis(&self) -> Result<u64, JobError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JobError::Clock(e.to_string()))?;
        Ok(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<u64>>,
    failing: Arc<AtomicBool>,
}

impl FakeClock {
    /// 2023-11-14T22:13:20Z
    const START_MILLIS: u64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Self::START_MILLIS)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let step = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        *current = current.saturating_add(step);
    }

    /// Set the clock to a specific number of milliseconds since the epoch
    pub fn set(&self, millis: u64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = millis;
    }

    /// Make every subsequent read fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_millis(&self) -> Result<u64, JobError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JobError::Clock("fake clock set to fail".to_string()));
        }
        Ok(*self.current.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
