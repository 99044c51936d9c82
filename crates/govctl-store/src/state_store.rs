//! State Store (spec §4.E): the single canonical runtime-state document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use govctl_types::{PacketId, PacketRuntimeState};
use serde::{Deserialize, Serialize};

use crate::atomic::{atomic_write, LockGuard};
use crate::error::StoreResult;

/// Current schema version written to new state documents.
pub const STATE_SCHEMA_VERSION: u32 = 1;

/// The single canonical document: `{schema_version, packets, metadata}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    /// Schema version of this document, bumped on breaking format changes.
    pub schema_version: u32,
    /// Runtime state for every packet that has been touched at least once.
    pub packets: BTreeMap<PacketId, PacketRuntimeState>,
    /// Free-form metadata (definition hash, last checkpoint id, etc.).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            packets: BTreeMap::new(),
            metadata: serde_json::json!({}),
        }
    }
}

impl StateDocument {
    /// Hash of the runtime state of a single packet, as bound into that
    /// packet's `Head.post_state_hash` (spec invariant: `SHA256(canonical
    /// (runtime_state(p))) == Head.post_state_hash` at rest).
    pub fn packet_post_state_hash(&self, packet_id: &str) -> StoreResult<Option<String>> {
        match self.packets.get(packet_id) {
            Some(state) => Ok(Some(govctl_canon::hash_value(state)?)),
            None => Ok(None),
        }
    }
}

/// Persistence for the single state document at `<root>/state.json`.
///
/// Writes are atomic and always performed under the global lock so that a
/// commit append and its corresponding state write happen in the same
/// critical section (spec §4.E, §5).
pub struct StateStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl StateStore {
    /// `root` is the governance root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            path: root.join("state.json"),
            lock_path: root.join(".state.lock"),
        }
    }

    /// Acquire the global state lock. Callers that need to write both the
    /// state document and a DCL commit within one critical section should
    /// hold this guard across both operations.
    pub fn lock(&self) -> StoreResult<LockGuard> {
        LockGuard::acquire(&self.lock_path)
    }

    /// Load the state document, or the default empty document if it has
    /// never been written.
    pub fn load(&self) -> StoreResult<StateDocument> {
        if !self.path.exists() {
            return Ok(StateDocument::default());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the state document atomically. Callers performing a lifecycle
    /// transition must hold the lock from [`Self::lock`] across this call
    /// and the matching commit append.
    pub fn save(&self, doc: &StateDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        atomic_write(&self.path, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_types::PacketRuntimeState;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_document_returns_default() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let doc = store.load().unwrap();
        assert_eq!(doc, StateDocument::default());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let mut doc = StateDocument::default();
        doc.packets.insert("pkt-a".to_string(), PacketRuntimeState::pending());

        store.save(&doc).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_packet_post_state_hash_deterministic() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let mut doc = StateDocument::default();
        doc.packets.insert("pkt-a".to_string(), PacketRuntimeState::pending());
        store.save(&doc).unwrap();

        let h1 = doc.packet_post_state_hash("pkt-a").unwrap().unwrap();
        let h2 = doc.packet_post_state_hash("pkt-a").unwrap().unwrap();
        assert_eq!(h1, h2);
        assert_eq!(doc.packet_post_state_hash("missing").unwrap(), None);
    }
}
