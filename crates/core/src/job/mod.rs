// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs: the unit of admission for work on a resource
//!
//! - **JobType / JobMask** - what a job does, and which types an async job lets through
//! - **JobStatus** - lifecycle flags
//! - **Job** - the shared synchronization primitive threads block on

mod kind;
mod object;
mod resource;
mod status;

pub use kind::{JobMask, JobType};
pub(crate) use object::WeakJob;
pub use object::{BeginOutcome, Job, JobOutcome, JobSnapshot, ResumeOutcome};
pub use resource::ResourceRef;
pub use status::JobStatus;
