//! Shared fixtures for integration tests

#![allow(dead_code)]

use dynconf::{Config, HomeConfigPaths};
use std::path::PathBuf;
use tempfile::TempDir;

/// A config whose default locations live in a throwaway home directory
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn paths(&self) -> HomeConfigPaths {
        HomeConfigPaths::with_home(self.dir.path())
    }

    pub fn config(&self) -> Config {
        Config::with_paths(&self.paths())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}
