//! Project checkpoint persistence (spec §4.D, §6 layout:
//! `dcl/project-checkpoints/<checkpoint_id>.json`).

use std::fs;
use std::path::{Path, PathBuf};

use govctl_types::ProjectCheckpoint;

use crate::atomic::atomic_write;
use crate::error::{StoreError, StoreResult};

/// Persistence for immutable [`ProjectCheckpoint`] snapshots.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// `root` is the governance root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("dcl").join("project-checkpoints"),
        }
    }

    /// Write a new checkpoint. Checkpoints are immutable once written;
    /// writing the same `checkpoint_id` twice overwrites atomically but
    /// callers should treat `checkpoint_id` as unique (UUID-derived).
    pub fn write(&self, checkpoint: &ProjectCheckpoint) -> StoreResult<()> {
        let path = self.dir.join(format!("{}.json", checkpoint.checkpoint_id));
        atomic_write(path, &serde_json::to_vec(checkpoint)?)?;
        Ok(())
    }

    /// Read one checkpoint by id.
    pub fn read(&self, checkpoint_id: &str) -> StoreResult<ProjectCheckpoint> {
        let path = self.dir.join(format!("{checkpoint_id}.json"));
        if !path.exists() {
            return Err(StoreError::NotFound(format!("checkpoint {checkpoint_id}")));
        }
        Ok(serde_json::from_slice(&fs::read(&path)?)?)
    }

    /// List every checkpoint, ordered by `created_at` ascending.
    pub fn list(&self) -> StoreResult<Vec<ProjectCheckpoint>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                let bytes = fs::read(entry.path())?;
                checkpoints.push(serde_json::from_slice::<ProjectCheckpoint>(&bytes)?);
            }
        }
        checkpoints.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(checkpoints)
    }

    /// The most recently created checkpoint, if any.
    pub fn latest(&self) -> StoreResult<Option<ProjectCheckpoint>> {
        Ok(self.list()?.into_iter().last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample() -> ProjectCheckpoint {
        ProjectCheckpoint {
            checkpoint_id: Uuid::new_v4(),
            created_at: Utc::now(),
            head_table: BTreeMap::new(),
            checkpoint_hash: "a".repeat(64),
        }
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let checkpoint = sample();
        store.write(&checkpoint).unwrap();

        let loaded = store.read(&checkpoint.checkpoint_id.to_string()).unwrap();
        assert_eq!(loaded.checkpoint_id, checkpoint.checkpoint_id);
    }

    #[test]
    fn test_latest_returns_none_when_empty() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_list_returns_all_written_checkpoints() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.write(&sample()).unwrap();
        store.write(&sample()).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }
}
