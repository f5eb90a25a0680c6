#![allow(dead_code)]

use async_trait::async_trait;
use migration_generator::diff::{DiffError, DiffOutcome, DiffProvider, Direction};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a migrations directory containing the given (empty) files
pub async fn create_migrations_dir(root: &Path, files: &[&str]) -> std::path::PathBuf {
    let dir = root.join("migrations");
    tokio::fs::create_dir_all(&dir)
        .await
        .expect("Failed to create migrations dir");
    for name in files {
        tokio::fs::write(dir.join(name), "-- existing\n")
            .await
            .expect("Failed to write migration");
    }
    dir
}

/// Sorted file names in a directory
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Diff provider returning canned scripts
pub struct FakeDiff {
    up: String,
    down: String,
    calls: Mutex<Vec<Direction>>,
}

impl FakeDiff {
    pub fn new(up: &str, down: &str) -> Self {
        Self {
            up: up.to_string(),
            down: down.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Directions requested so far, sorted
    pub fn calls(&self) -> Vec<Direction> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|d| matches!(d, Direction::Down));
        calls
    }
}

#[async_trait]
impl DiffProvider for FakeDiff {
    async fn diff(&self, direction: Direction) -> Result<DiffOutcome, DiffError> {
        self.calls.lock().unwrap().push(direction);
        let script = match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        };
        Ok(DiffOutcome::from_script(script))
    }
}

/// Diff provider whose tool exits non-zero for one direction
pub struct FailingDiff {
    pub failing: Direction,
}

#[async_trait]
impl DiffProvider for FailingDiff {
    async fn diff(&self, direction: Direction) -> Result<DiffOutcome, DiffError> {
        if direction == self.failing {
            Err(DiffError::Failed {
                direction,
                code: Some(1),
                stderr: "P1001: Can't reach database server".to_string(),
            })
        } else {
            Ok(DiffOutcome::Changes("SELECT 1;".to_string()))
        }
    }
}
