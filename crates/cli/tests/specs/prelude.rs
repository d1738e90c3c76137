//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use predicates::prelude::*;

/// Scratch directory holding config files for one spec
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root and return its path
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn jobctl(&self) -> Cli {
        let mut cmd = Command::cargo_bin("jobctl").unwrap();
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        Cli { cmd }
    }
}

pub fn jobctl() -> Cli {
    let mut cmd = Command::cargo_bin("jobctl").unwrap();
    cmd.env_remove("RUST_LOG");
    Cli { cmd }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Run {
        Run(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> Run {
        Run(self.cmd.assert().failure())
    }
}

pub struct Run(Assert);

impl Run {
    pub fn stdout_has(self, needle: &str) -> Self {
        Run(self.0.stdout(predicate::str::contains(needle)))
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        Run(self.0.stdout(predicate::str::contains(needle).not()))
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        Run(self.0.stderr(predicate::str::contains(needle)))
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.0.get_output().stderr).into_owned()
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.0.get_output().stdout).unwrap()
    }
}
