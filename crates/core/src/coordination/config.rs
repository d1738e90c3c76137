// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! async_allowed = true
//! max_queued_jobs = 5
//! wait_limit = "30s"
//! async_mask = ["query"]
//! ```

use crate::job::{JobMask, JobType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading a coordinator configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Per-resource admission settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Whether the resource has an async job slot
    pub async_allowed: bool,
    /// Bound on threads waiting for admission; unset means unlimited
    pub max_queued_jobs: Option<usize>,
    /// Admission deadline; zero waits indefinitely
    #[serde(with = "humantime_serde")]
    pub wait_limit: Duration,
    /// Job types admitted while an async job is active
    pub async_mask: Vec<JobType>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            async_allowed: true,
            max_queued_jobs: None,
            wait_limit: Duration::from_secs(30),
            async_mask: vec![JobType::Query],
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoordinatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.async_mask.contains(&JobType::None) {
            return Err(ConfigError::Invalid(
                "async_mask cannot contain `none`".to_string(),
            ));
        }
        Ok(())
    }

    /// Mask installed when an async job begins
    pub fn async_mask(&self) -> JobMask {
        self.async_mask.iter().copied().collect()
    }

    /// Admission deadline, or `None` to wait indefinitely
    pub fn wait_deadline(&self) -> Option<Duration> {
        (!self.wait_limit.is_zero()).then_some(self.wait_limit)
    }

    pub fn with_async_allowed(mut self, allowed: bool) -> Self {
        self.async_allowed = allowed;
        self
    }

    pub fn with_max_queued_jobs(mut self, max: Option<usize>) -> Self {
        self.max_queued_jobs = max;
        self
    }

    pub fn with_wait_limit(mut self, limit: Duration) -> Self {
        self.wait_limit = limit;
        self
    }

    pub fn with_async_mask(mut self, types: impl IntoIterator<Item = JobType>) -> Self {
        self.async_mask = types.into_iter().collect();
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
