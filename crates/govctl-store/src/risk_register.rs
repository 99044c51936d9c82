//! Residual risk register persistence (`<root>/risk-register.json`,
//! spec §6 on-disk layout; optional file).

use std::fs;
use std::path::{Path, PathBuf};

use govctl_types::ResidualRiskEntry;

use crate::atomic::{atomic_write, LockGuard};
use crate::error::StoreResult;

/// Persistence for the residual risk register: a flat JSON array of
/// [`ResidualRiskEntry`] records, rewritten atomically on each append or
/// status update.
pub struct RiskRegisterStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl RiskRegisterStore {
    /// `root` is the governance root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            path: root.join("risk-register.json"),
            lock_path: root.join(".risk_register.lock"),
        }
    }

    /// Load all entries, empty if the file has never been written.
    pub fn load(&self) -> StoreResult<Vec<ResidualRiskEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&fs::read(&self.path)?)?)
    }

    /// Append one entry under the register's lock, rewriting the file
    /// atomically.
    pub fn append(&self, entry: ResidualRiskEntry) -> StoreResult<()> {
        let _lock = LockGuard::acquire(&self.lock_path)?;
        let mut entries = self.load()?;
        entries.push(entry);
        atomic_write(&self.path, &serde_json::to_vec_pretty(&entries)?)?;
        Ok(())
    }

    /// Every entry with `status = open`.
    pub fn open_entries(&self) -> StoreResult<Vec<ResidualRiskEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| e.status == govctl_types::RiskStatus::Open)
            .collect())
    }
}
