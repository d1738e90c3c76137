// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-resource admission control
//!
//! This module provides:
//! - **Coordinator** - sync and async job slots plus the async admission mask
//! - **JobGuard** - scoped admission that ends the job on drop
//! - **CoordinatorConfig** - TOML-loadable coordinator settings

mod config;
mod coordinator;
mod guard;

pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{Coordinator, CoordinatorSnapshot};
pub use guard::JobGuard;
