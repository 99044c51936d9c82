//! The Verifier (spec §4.I): per-packet chain verification, HEAD and
//! runtime-state binding, history inspection, proof export, and on-demand
//! project checkpoints.
//!
//! Grounded on `ledger/src/storage.rs`'s `Storage::verify_chain`-style
//! linkage walk (recompute each block's hash, compare to its recorded
//! predecessor), generalized here from one linear ledger to one chain per
//! packet plus the cross-cutting HEAD/runtime-state bindings spec §4.I
//! adds on top.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use govctl_defs::Definitions;
use govctl_store::{CheckpointStore, CommitStore, StateStore};
use govctl_types::{DclCommit, PacketId, ProjectCheckpoint, GENESIS};

use crate::error::{VerifyError, VerifyResult, VerifyRunError};
use crate::report::{PacketVerification, ProofManifest, VerifyAllReport};

/// Verifies DCL commit chains, HEAD pointers, and runtime-state bindings
/// against what's on disk at `root`.
pub struct Verifier {
    root: PathBuf,
    definitions: Definitions,
    commit_store: CommitStore,
    state_store: StateStore,
    checkpoint_store: CheckpointStore,
}

impl Verifier {
    /// Open a verifier rooted at `root` (the directory containing
    /// `definition.json`).
    pub fn open(root: impl AsRef<Path>) -> VerifyResult<Self> {
        let root = root.as_ref().to_path_buf();
        let definitions = Definitions::load(root.join("definition.json"))?;
        Ok(Self {
            commit_store: CommitStore::new(&root),
            state_store: StateStore::new(&root),
            checkpoint_store: CheckpointStore::new(&root),
            definitions,
            root,
        })
    }

    /// The loaded definition schema, for callers that want to cross-check
    /// packet ids before verifying.
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Every packet id that currently has a commit chain.
    pub fn known_packet_ids(&self) -> VerifyResult<Vec<PacketId>> {
        Ok(self.commit_store.list_packet_ids()?)
    }

    /// `verify(packet_id)` (spec §4.I): walk the chain, confirm every
    /// continuity rule, confirm HEAD, confirm runtime-state binding.
    /// Never returns `Err` for a failed verification — failures are
    /// reported in [`PacketVerification::failures`]; `Err` is reserved for
    /// I/O or definition-load failures that prevented the check from
    /// running at all.
    pub fn verify_packet(&self, packet_id: &str) -> VerifyResult<PacketVerification> {
        let chain = self.commit_store.read_all_commits(packet_id)?;
        let mut failures = Vec::new();

        for (i, commit) in chain.iter().enumerate() {
            let expected_seq = i as u64 + 1;
            if commit.seq != expected_seq {
                failures.push(VerifyError::ErrSeqDiscontinuity {
                    packet_id: packet_id.to_string(),
                    expected: expected_seq,
                    found: commit.seq,
                });
            }

            let recomputed = govctl_store::compute_commit_hash(commit)?;
            if recomputed != commit.commit_hash {
                failures.push(VerifyError::ErrCommitHashMismatch {
                    packet_id: packet_id.to_string(),
                    seq: commit.seq,
                });
            }

            match i.checked_sub(1).map(|prev| &chain[prev]) {
                None => {
                    if commit.prev_commit_hash != GENESIS {
                        failures.push(VerifyError::ErrPrevHashMismatch {
                            packet_id: packet_id.to_string(),
                            seq: commit.seq,
                        });
                    }
                }
                Some(prev) => {
                    if commit.prev_commit_hash != prev.commit_hash {
                        failures.push(VerifyError::ErrPrevHashMismatch {
                            packet_id: packet_id.to_string(),
                            seq: commit.seq,
                        });
                    }
                    if commit.pre_state_hash != prev.post_state_hash {
                        failures.push(VerifyError::ErrStateHashMismatch {
                            packet_id: packet_id.to_string(),
                            seq: commit.seq,
                        });
                    }
                }
            }
        }

        let head = self.commit_store.read_head(packet_id)?;
        match (&head, chain.last()) {
            (Some(h), Some(last)) if h.seq != last.seq || h.commit_hash != last.commit_hash => {
                failures.push(VerifyError::ErrHeadDrift {
                    packet_id: packet_id.to_string(),
                });
            }
            (None, Some(_)) | (Some(_), None) => {
                failures.push(VerifyError::ErrHeadDrift {
                    packet_id: packet_id.to_string(),
                });
            }
            _ => {}
        }

        if let Some(h) = &head {
            let doc = self.state_store.load()?;
            let runtime_hash = doc.packet_post_state_hash(packet_id)?;
            if runtime_hash.as_deref() != Some(h.post_state_hash.as_str()) {
                failures.push(VerifyError::ErrRuntimeBindingMismatch {
                    packet_id: packet_id.to_string(),
                });
            }
        }

        Ok(PacketVerification {
            packet_id: packet_id.to_string(),
            ok: failures.is_empty(),
            commit_count: chain.len(),
            failures,
        })
    }

    /// `verify --all` (spec §4.I): every packet with a chain, plus the
    /// latest project checkpoint if one exists.
    pub fn verify_all(&self) -> VerifyResult<VerifyAllReport> {
        let mut packets = Vec::new();
        for packet_id in self.commit_store.list_packet_ids()? {
            packets.push(self.verify_packet(&packet_id)?);
        }

        let checkpoint_failure = match self.checkpoint_store.latest()? {
            Some(checkpoint) => self.verify_checkpoint(&checkpoint)?,
            None => None,
        };

        let ok = packets.iter().all(|p| p.ok) && checkpoint_failure.is_none();
        Ok(VerifyAllReport {
            ok,
            packets,
            checkpoint_failure,
        })
    }

    fn verify_checkpoint(&self, checkpoint: &ProjectCheckpoint) -> VerifyResult<Option<VerifyError>> {
        for (packet_id, recorded_head) in &checkpoint.head_table {
            let current = self.commit_store.read_head(packet_id)?;
            if current.as_ref() != Some(recorded_head) {
                return Ok(Some(VerifyError::ErrCheckpointDrift {
                    checkpoint_id: checkpoint.checkpoint_id.to_string(),
                }));
            }
        }
        Ok(None)
    }

    /// `history(packet_id)` (spec §4.I): the ordered commit list, as-is.
    /// Callers that want computed/recomputed hashes alongside should pair
    /// this with [`Self::verify_packet`].
    pub fn history(&self, packet_id: &str) -> VerifyResult<Vec<DclCommit>> {
        Ok(self.commit_store.read_all_commits(packet_id)?)
    }

    /// `export-proof(packet_id)` (spec §4.I): a sealed, self-contained
    /// manifest a third party can verify without the rest of the root.
    pub fn export_proof(&self, packet_id: &str) -> VerifyResult<ProofManifest> {
        let definition_excerpt = self
            .definitions
            .packet(packet_id)
            .ok_or_else(|| {
                VerifyRunError::Store(govctl_store::StoreError::NotFound(format!(
                    "packet '{packet_id}' has no definition"
                )))
            })?
            .clone();
        let commits = self.commit_store.read_all_commits(packet_id)?;
        let constitution_raw = fs::read(self.root.join("constitution.txt")).unwrap_or_default();
        let constitution_snapshot = String::from_utf8_lossy(&constitution_raw).into_owned();
        let doc = self.state_store.load()?;
        let runtime_state = doc
            .packets
            .get(packet_id)
            .cloned()
            .unwrap_or_else(govctl_types::PacketRuntimeState::pending);

        let mut manifest = ProofManifest {
            packet_id: packet_id.to_string(),
            exported_at: Utc::now(),
            definition_excerpt,
            commits,
            constitution_snapshot,
            runtime_state,
            manifest_hash: String::new(),
        };
        manifest.manifest_hash = govctl_canon::hash_value(&manifest)?;
        Ok(manifest)
    }

    /// `checkpoint()` (spec §4.I): snapshot every known packet's current
    /// HEAD into a new [`ProjectCheckpoint`] and persist it. Unlike
    /// `closeout-l2` (`govctl-kernel`), this is not area-scoped and has no
    /// all-done precondition — it's a general "checkpoint now" utility and
    /// does not append a lifecycle log entry.
    pub fn checkpoint(&self) -> VerifyResult<ProjectCheckpoint> {
        let mut head_table = std::collections::BTreeMap::new();
        for packet_id in self.definitions.packets().map(|p| p.id.clone()) {
            if let Some(head) = self.commit_store.read_head(&packet_id)? {
                head_table.insert(packet_id, head);
            }
        }
        let checkpoint_hash = govctl_canon::hash_value(&head_table)?;
        let checkpoint = ProjectCheckpoint {
            checkpoint_id: uuid::Uuid::new_v4(),
            created_at: Utc::now(),
            head_table,
            checkpoint_hash,
        };
        self.checkpoint_store.write(&checkpoint)?;
        Ok(checkpoint)
    }
}
