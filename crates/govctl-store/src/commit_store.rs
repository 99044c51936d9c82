//! DCL Commit Store (spec §4.D): per-packet hash-linked commit chains, the
//! `HEAD` pointer, and journal-based crash recovery.

use std::fs;
use std::path::{Path, PathBuf};

use govctl_types::{DclCommit, Head, Journal, JournalPhase, GENESIS};

use crate::atomic::{atomic_write, LockGuard};
use crate::error::{StoreError, StoreResult};

/// Outcome of running recovery for a single packet, returned so `doctor`
/// can report exactly what it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No journal present; nothing to do.
    Clean,
    /// Journal was in `prepare` phase with no commit file at `target_seq`:
    /// discarded, HEAD left unchanged.
    RolledBack { target_seq: u64 },
    /// Journal was in `prepare` phase with a valid commit file already
    /// present: HEAD advanced and journal cleared.
    Completed { target_seq: u64 },
    /// Journal was in `done` phase (HEAD already correct): journal unlinked.
    JournalCleared,
}

/// Compute the `commit_hash` of a [`DclCommit`]: SHA-256 over the canonical
/// form of the commit with the `commit_hash` field itself removed.
pub fn compute_commit_hash(commit: &DclCommit) -> StoreResult<String> {
    let mut value = serde_json::to_value(commit)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("commit_hash");
    }
    Ok(govctl_canon::hash_value(&value)?)
}

/// Persistence for per-packet DCL commit chains, rooted at
/// `<root>/dcl/packets/`.
pub struct CommitStore {
    packets_root: PathBuf,
}

impl CommitStore {
    /// `root` is the governance root directory (the directory containing
    /// `definition.json`); this store operates under `<root>/dcl/packets`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            packets_root: root.as_ref().join("dcl").join("packets"),
        }
    }

    fn packet_dir(&self, packet_id: &str) -> PathBuf {
        self.packets_root.join(packet_id)
    }

    fn commits_dir(&self, packet_id: &str) -> PathBuf {
        self.packet_dir(packet_id).join("commits")
    }

    fn head_path(&self, packet_id: &str) -> PathBuf {
        self.packet_dir(packet_id).join("HEAD")
    }

    fn journal_path(&self, packet_id: &str) -> PathBuf {
        self.packet_dir(packet_id).join("journal.json")
    }

    fn lock_path(&self, packet_id: &str) -> PathBuf {
        self.packet_dir(packet_id).join(".lock")
    }

    fn commit_path(&self, packet_id: &str, seq: u64) -> PathBuf {
        self.commits_dir(packet_id).join(format!("{seq:06}.json"))
    }

    /// List every packet id that has ever had a commit written (i.e. has a
    /// DCL directory). Used by `verify --all` and `doctor`.
    pub fn list_packet_ids(&self) -> StoreResult<Vec<String>> {
        if !self.packets_root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.packets_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Read the current HEAD for a packet, `None` if the packet has never
    /// committed. Lock-free: `atomic_write`'s write-temp/rename protocol
    /// guarantees this always observes either the previous HEAD or the
    /// fully-written new one, never a partial file, even while a journal for
    /// the next commit is transiently present (spec §4.D).
    pub fn read_head(&self, packet_id: &str) -> StoreResult<Option<Head>> {
        self.try_read_head(packet_id)
    }

    fn try_read_head(&self, packet_id: &str) -> StoreResult<Option<Head>> {
        let path = self.head_path(packet_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Read one commit by sequence number.
    pub fn read_commit(&self, packet_id: &str, seq: u64) -> StoreResult<DclCommit> {
        let path = self.commit_path(packet_id, seq);
        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "commit {packet_id}@{seq}"
            )));
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Read the whole commit chain for a packet, ordered by `seq` ascending.
    pub fn read_all_commits(&self, packet_id: &str) -> StoreResult<Vec<DclCommit>> {
        let dir = self.commits_dir(packet_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut seqs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(stem) = name.strip_suffix(".json") {
                    if let Ok(seq) = stem.parse::<u64>() {
                        seqs.push(seq);
                    }
                }
            }
        }
        seqs.sort_unstable();
        seqs.into_iter()
            .map(|seq| self.read_commit(packet_id, seq))
            .collect()
    }

    /// Append a new commit to a packet's chain under the packet's lock,
    /// following the 5-step write protocol in spec §4.D.
    ///
    /// `build` receives `(seq, prev_commit_hash)` and must return a fully
    /// populated [`DclCommit`] with `commit_hash` already set to
    /// [`compute_commit_hash`] of the rest of its fields.
    pub fn append_commit<F>(&self, packet_id: &str, build: F) -> StoreResult<DclCommit>
    where
        F: FnOnce(u64, String) -> StoreResult<DclCommit>,
    {
        let _lock = LockGuard::acquire(self.lock_path(packet_id))?;
        self.recover_locked(packet_id)?;

        let head = self.try_read_head(packet_id)?;
        let (seq, prev_commit_hash) = match &head {
            Some(h) => (h.seq + 1, h.commit_hash.clone()),
            None => (1, GENESIS.to_string()),
        };

        let commit = build(seq, prev_commit_hash)?;
        let payload_bytes = serde_json::to_vec(&commit)?;
        let payload_hash = govctl_canon::hash_value(&commit)?;

        // Step 2: journal prepare.
        let journal = Journal {
            phase: JournalPhase::Prepare,
            target_seq: seq,
            payload_hash,
        };
        atomic_write(self.journal_path(packet_id), &serde_json::to_vec(&journal)?)?;

        // Step 3: write the commit file.
        atomic_write(self.commit_path(packet_id, seq), &payload_bytes)?;

        // Step 4: advance HEAD.
        let new_head = Head::from_commit(&commit);
        atomic_write(self.head_path(packet_id), &serde_json::to_vec(&new_head)?)?;

        // Step 5: journal -> done, then unlink.
        let done_journal = Journal {
            phase: JournalPhase::Done,
            ..journal
        };
        atomic_write(self.journal_path(packet_id), &serde_json::to_vec(&done_journal)?)?;
        remove_if_exists(&self.journal_path(packet_id))?;

        tracing::info!(packet_id, seq, "appended DCL commit");
        Ok(commit)
    }

    /// Run journal recovery for a single packet, acquiring the packet lock
    /// itself. Safe to call repeatedly (idempotent); used by `doctor` and at
    /// process start.
    pub fn recover_packet(&self, packet_id: &str) -> StoreResult<RecoveryOutcome> {
        let _lock = LockGuard::acquire(self.lock_path(packet_id))?;
        self.recover_locked(packet_id)
    }

    /// Same as [`Self::recover_packet`] but assumes the caller already holds
    /// the packet lock (used internally by [`Self::append_commit`] so a new
    /// write always starts from a clean slate).
    fn recover_locked(&self, packet_id: &str) -> StoreResult<RecoveryOutcome> {
        let journal_path = self.journal_path(packet_id);
        if !journal_path.exists() {
            return Ok(RecoveryOutcome::Clean);
        }

        let bytes = fs::read(&journal_path)?;
        let journal: Journal = serde_json::from_slice(&bytes).map_err(|e| StoreError::JournalCorrupt {
            packet_id: packet_id.to_string(),
            detail: e.to_string(),
        })?;

        match journal.phase {
            JournalPhase::Done => {
                remove_if_exists(&journal_path)?;
                tracing::info!(packet_id, "cleared stale done-phase journal");
                Ok(RecoveryOutcome::JournalCleared)
            }
            JournalPhase::Prepare => {
                let commit_path = self.commit_path(packet_id, journal.target_seq);
                if !commit_path.exists() {
                    remove_if_exists(&journal_path)?;
                    tracing::warn!(packet_id, seq = journal.target_seq, "rolled back incomplete commit");
                    return Ok(RecoveryOutcome::RolledBack {
                        target_seq: journal.target_seq,
                    });
                }

                let commit: DclCommit = {
                    let raw = fs::read(&commit_path)?;
                    serde_json::from_slice(&raw)?
                };
                let recomputed = compute_commit_hash(&commit)?;
                if recomputed != commit.commit_hash {
                    return Err(StoreError::ChainCorrupt {
                        packet_id: packet_id.to_string(),
                        seq: journal.target_seq,
                        detail: "commit_hash does not match recomputed canonical hash".to_string(),
                    });
                }

                let head = self.try_read_head(packet_id)?;
                let already_advanced = head.as_ref().map(|h| h.seq) == Some(journal.target_seq);
                if !already_advanced {
                    let new_head = Head::from_commit(&commit);
                    atomic_write(self.head_path(packet_id), &serde_json::to_vec(&new_head)?)?;
                }
                remove_if_exists(&journal_path)?;
                tracing::info!(packet_id, seq = journal.target_seq, "completed in-flight commit");
                Ok(RecoveryOutcome::Completed {
                    target_seq: journal.target_seq,
                })
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use govctl_types::ActionEnvelope;
    use govctl_types::LifecycleEvent;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_commit(seq: u64, prev_hash: String) -> StoreResult<DclCommit> {
        let mut commit = DclCommit {
            commit_id: Uuid::new_v4(),
            packet_id: "pkt-a".to_string(),
            seq,
            prev_commit_hash: prev_hash,
            action_hash: "a".repeat(64),
            pre_state_hash: "b".repeat(64),
            post_state_hash: "c".repeat(64),
            constitution_hash: "d".repeat(64),
            diff: serde_json::json!({"op": "replace", "path": "/status", "value": "in_progress"}),
            created_at: Utc::now(),
            action_envelope: ActionEnvelope {
                event: LifecycleEvent::Claimed,
                actor: "alice".to_string(),
                inputs: serde_json::json!({}),
                timestamp: Utc::now(),
            },
            commit_hash: String::new(),
        };
        commit.commit_hash = compute_commit_hash(&commit)?;
        Ok(commit)
    }

    #[test]
    fn test_append_commit_chain_and_head() {
        let dir = tempdir().unwrap();
        let store = CommitStore::new(dir.path());

        let c1 = store
            .append_commit("pkt-a", |seq, prev| sample_commit(seq, prev))
            .unwrap();
        assert_eq!(c1.seq, 1);
        assert_eq!(c1.prev_commit_hash, GENESIS);

        let c2 = store
            .append_commit("pkt-a", |seq, prev| sample_commit(seq, prev))
            .unwrap();
        assert_eq!(c2.seq, 2);
        assert_eq!(c2.prev_commit_hash, c1.commit_hash);

        let head = store.read_head("pkt-a").unwrap().unwrap();
        assert_eq!(head.seq, 2);
        assert_eq!(head.commit_hash, c2.commit_hash);

        let chain = store.read_all_commits("pkt-a").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].seq, 1);
        assert_eq!(chain[1].seq, 2);
    }

    #[test]
    fn test_recover_rolls_back_prepare_with_no_commit_file() {
        let dir = tempdir().unwrap();
        let store = CommitStore::new(dir.path());
        let journal = Journal {
            phase: JournalPhase::Prepare,
            target_seq: 1,
            payload_hash: "x".repeat(64),
        };
        fs::create_dir_all(store.packet_dir("pkt-b")).unwrap();
        atomic_write(store.journal_path("pkt-b"), &serde_json::to_vec(&journal).unwrap()).unwrap();

        let outcome = store.recover_packet("pkt-b").unwrap();
        assert_eq!(outcome, RecoveryOutcome::RolledBack { target_seq: 1 });
        assert!(store.read_head("pkt-b").unwrap().is_none());
        assert!(!store.journal_path("pkt-b").exists());
    }

    #[test]
    fn test_recover_completes_prepare_with_valid_commit_file() {
        let dir = tempdir().unwrap();
        let store = CommitStore::new(dir.path());
        let commit = sample_commit(1, GENESIS.to_string()).unwrap();

        atomic_write(
            store.commit_path("pkt-c", 1),
            &serde_json::to_vec(&commit).unwrap(),
        )
        .unwrap();
        let journal = Journal {
            phase: JournalPhase::Prepare,
            target_seq: 1,
            payload_hash: govctl_canon::hash_value(&commit).unwrap(),
        };
        atomic_write(store.journal_path("pkt-c"), &serde_json::to_vec(&journal).unwrap()).unwrap();

        let outcome = store.recover_packet("pkt-c").unwrap();
        assert_eq!(outcome, RecoveryOutcome::Completed { target_seq: 1 });
        let head = store.read_head("pkt-c").unwrap().unwrap();
        assert_eq!(head.seq, 1);
        assert_eq!(head.commit_hash, commit.commit_hash);
        assert!(!store.journal_path("pkt-c").exists());
    }

    #[test]
    fn test_recover_clears_done_phase_journal() {
        let dir = tempdir().unwrap();
        let store = CommitStore::new(dir.path());
        fs::create_dir_all(store.packet_dir("pkt-d")).unwrap();
        let journal = Journal {
            phase: JournalPhase::Done,
            target_seq: 1,
            payload_hash: "x".repeat(64),
        };
        atomic_write(store.journal_path("pkt-d"), &serde_json::to_vec(&journal).unwrap()).unwrap();

        let outcome = store.recover_packet("pkt-d").unwrap();
        assert_eq!(outcome, RecoveryOutcome::JournalCleared);
        assert!(!store.journal_path("pkt-d").exists());
    }

    #[test]
    fn test_recover_clean_when_no_journal() {
        let dir = tempdir().unwrap();
        let store = CommitStore::new(dir.path());
        let outcome = store.recover_packet("pkt-e").unwrap();
        assert_eq!(outcome, RecoveryOutcome::Clean);
    }
}
