// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource back-references

use serde::{Deserialize, Serialize};

/// Non-owning reference to the resource a job runs on
///
/// Holds the resource's name only; resolving it to a live object is up to the
/// driver that owns the resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ResourceRef {
    Domain(String),
    StorageVolume(String),
    StoragePool(String),
}

impl ResourceRef {
    pub fn name(&self) -> &str {
        match self {
            ResourceRef::Domain(name)
            | ResourceRef::StorageVolume(name)
            | ResourceRef::StoragePool(name) => name,
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceRef::Domain(name) => write!(f, "domain:{name}"),
            ResourceRef::StorageVolume(name) => write!(f, "volume:{name}"),
            ResourceRef::StoragePool(name) => write!(f, "pool:{name}"),
        }
    }
}
