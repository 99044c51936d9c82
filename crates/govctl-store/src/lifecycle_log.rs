//! Lifecycle Log (spec §4.K).
//!
//! Of the two disciplines the spec allows, this implementation uses a
//! separate append-only file (`<root>/lifecycle.log`, one canonical JSON
//! object per line) flushed and fsynced per entry, rather than an array
//! embedded in `state.json`. See `DESIGN.md` for the reasoning.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use govctl_types::LifecycleLogEntry;

use crate::atomic::LockGuard;
use crate::error::StoreResult;

/// Append-only store for [`LifecycleLogEntry`] records.
pub struct LifecycleLog {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LifecycleLog {
    /// `root` is the governance root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            path: root.join("lifecycle.log"),
            lock_path: root.join(".lifecycle_log.lock"),
        }
    }

    /// Append one entry. The write is flushed and fsynced before returning,
    /// so a crash after this call returns guarantees the entry is durable;
    /// a crash during the call either leaves the entry entirely absent or,
    /// at worst, a trailing partial line that [`Self::read_all`] discards.
    pub fn append(&self, entry: &LifecycleLogEntry) -> StoreResult<()> {
        let _lock = LockGuard::acquire(&self.lock_path)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)?;
        file.sync_all()?;
        tracing::debug!(packet_id = ?entry.packet_id, event = ?entry.event, "appended lifecycle log entry");
        Ok(())
    }

    /// Read every well-formed entry in file order. A trailing line that
    /// fails to parse is treated as an in-flight write that never
    /// completed and is silently dropped, per spec §4.K ("readers must
    /// tolerate EOF mid-line").
    pub fn read_all(&self) -> StoreResult<Vec<LifecycleLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let mut entries = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LifecycleLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(_) if i + 1 == lines.len() => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(entries)
    }

    /// Read the last `n` well-formed entries.
    pub fn tail(&self, n: usize) -> StoreResult<Vec<LifecycleLogEntry>> {
        let mut all = self.read_all()?;
        if all.len() > n {
            all.drain(0..all.len() - n);
        }
        Ok(all)
    }
}
