//! Shared test infrastructure for integration tests
//!
//! Provides a throwaway project directory and a runner for the real
//! `version-stamp` binary with a scrubbed environment.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use version_stamp::types::VersionRecord;

/// Variables that would leak host configuration into a test run
const SCRUBBED_VARS: &[&str] = &[
    "STAMP_CONFIG",
    "STAMP_OUTPUT",
    "STAMP_TIME_BASIS",
    "STAMP_REPRODUCIBLE",
    "STAMP_LOG_LEVEL",
    "SOURCE_DATE_EPOCH",
    "RUST_LOG",
];

/// A project root laid out like a firmware tree: `data/` exists, nothing else.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    // ── Factory methods ──

    /// Project with an existing `data/` directory
    pub fn new() -> Self {
        let project = Self::bare();
        std::fs::create_dir(project.root().join("data")).expect("Failed to create data dir");
        project
    }

    /// Project without a `data/` directory
    pub fn bare() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    // ── Accessors ──

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn stamp_path(&self) -> PathBuf {
        self.root().join("data").join("version.json")
    }

    /// Parse the stamp currently on disk
    pub fn read_stamp(&self) -> VersionRecord {
        let bytes = std::fs::read(self.stamp_path()).expect("stamp should exist");
        serde_json::from_slice(&bytes).expect("stamp should be valid JSON")
    }

    /// Raw JSON value currently on disk
    pub fn read_json(&self) -> serde_json::Value {
        let bytes = std::fs::read(self.stamp_path()).expect("stamp should exist");
        serde_json::from_slice(&bytes).expect("stamp should be valid JSON")
    }

    // ── Running the binary ──

    /// Run the binary in the project root with `args` and no extra env.
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    /// Run the binary in the project root with `args` and `env` on top of a
    /// scrubbed environment.
    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_version-stamp"));
        cmd.current_dir(self.root()).args(args);
        for var in SCRUBBED_VARS {
            cmd.env_remove(var);
        }
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().expect("Failed to run version-stamp")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
