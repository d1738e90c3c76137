//! jobctl-core: job admission and mutual exclusion for shared resources
//!
//! This crate provides:
//! - The `Job` synchronization primitive threads block on while work runs
//! - Per-resource coordinators with a sync slot, an async slot and an admission mask
//! - A process-wide registry mapping job ids back to live jobs

pub mod clock;
pub mod error;
pub mod id;

pub mod coordination;
pub mod job;
pub mod registry;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use coordination::{
    ConfigError, Coordinator, CoordinatorConfig, CoordinatorSnapshot, JobGuard,
};
pub use error::JobError;
pub use id::JobId;
pub use job::{
    BeginOutcome, Job, JobMask, JobOutcome, JobSnapshot, JobStatus, JobType, ResourceRef,
    ResumeOutcome,
};
pub use registry::{registry, JobRegistry};
