//! Snapshot of the source tree taken at the end of a run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use super::tree::LocaleTree;
use crate::utils::{read_json_file, write_json_atomic};

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no snapshot has been taken yet.
    pub fn load(&self) -> Result<Option<LocaleTree>> {
        let value = read_json_file::<Value>(&self.path).context("Failed to load snapshot")?;
        value
            .map(|v| {
                LocaleTree::from_value(v)
                    .with_context(|| format!("Invalid snapshot: {}", self.path.display()))
            })
            .transpose()
    }

    pub fn save(&self, tree: &LocaleTree) -> Result<()> {
        write_json_atomic(&self.path, tree).context("Failed to save snapshot")
    }
}
