//! Deterministic Commitment Layer records: commits, heads, journals and
//! project checkpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, PacketId};

/// `GENESIS` sentinel used as `prev_commit_hash` for the first commit in a
/// packet's chain.
pub const GENESIS: &str = "GENESIS";

/// An immutable, hash-linked record of one lifecycle transition.
///
/// Every field except `commit_hash` participates in the hash computed over
/// the commit's canonical form; `commit_hash` is the result of that
/// computation and is therefore excluded from its own input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DclCommit {
    /// Unique identifier for this commit.
    pub commit_id: uuid::Uuid,
    /// The packet this commit belongs to.
    pub packet_id: PacketId,
    /// Strictly monotone sequence number, 1-based, dense per packet.
    pub seq: u64,
    /// Hash of the previous commit in this packet's chain, or [`GENESIS`].
    pub prev_commit_hash: String,
    /// SHA-256 hex digest of the canonical `{event, actor, inputs, timestamp}` action record.
    pub action_hash: String,
    /// SHA-256 hex digest of the canonical runtime state before the transition.
    pub pre_state_hash: String,
    /// SHA-256 hex digest of the canonical runtime state after the transition.
    pub post_state_hash: String,
    /// SHA-256 hex digest of the governance-rules document at transition time.
    pub constitution_hash: String,
    /// Structured JSON-Patch-style delta between pre- and post-state.
    pub diff: serde_json::Value,
    /// UTC creation timestamp.
    pub created_at: DateTime<Utc>,
    /// The original action record this commit was derived from.
    pub action_envelope: ActionEnvelope,
    /// SHA-256 hex digest of the canonical commit, excluding this field.
    pub commit_hash: String,
}

/// The original action record bound into every commit (spec §3
/// `action_envelope`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// The lifecycle event this action represents.
    pub event: crate::LifecycleEvent,
    /// The actor that issued the action.
    pub actor: ActorId,
    /// The inputs supplied to the action (e.g. assessment payloads).
    pub inputs: serde_json::Value,
    /// UTC timestamp the action was issued.
    pub timestamp: DateTime<Utc>,
}

/// Per-packet pointer to the latest commit: `{seq, commit_hash, post_state_hash}`.
///
/// A reader that sees `Head.commit_hash == h` is guaranteed that the
/// corresponding runtime state's canonical hash equals `h`'s `post_state_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Head {
    /// Sequence number of the latest commit.
    pub seq: u64,
    /// Hash of the latest commit.
    pub commit_hash: String,
    /// Post-state hash of the latest commit; must equal the hash of the
    /// current on-disk runtime state.
    pub post_state_hash: String,
}

impl Head {
    /// Build a `Head` pointer from a freshly written commit.
    pub fn from_commit(commit: &DclCommit) -> Self {
        Self {
            seq: commit.seq,
            commit_hash: commit.commit_hash.clone(),
            post_state_hash: commit.post_state_hash.clone(),
        }
    }
}

/// Phase of a transient, per-packet crash-recovery journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalPhase {
    /// A commit write has started but not yet been confirmed durable.
    Prepare,
    /// The commit write and HEAD advance are both durable; safe to unlink.
    Done,
}

/// Transient, per-packet crash-recovery journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    /// Current phase.
    pub phase: JournalPhase,
    /// The sequence number this journal entry targets.
    pub target_seq: u64,
    /// SHA-256 hex digest of the intended commit payload, used to confirm
    /// the on-disk commit file matches what the journal describes.
    pub payload_hash: String,
}

/// An immutable snapshot of all packet HEADs at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCheckpoint {
    /// Unique checkpoint identifier.
    pub checkpoint_id: uuid::Uuid,
    /// UTC creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Map from packet id to its HEAD triple at checkpoint time.
    pub head_table: BTreeMap<PacketId, Head>,
    /// SHA-256 hex digest over the canonical `head_table`.
    pub checkpoint_hash: String,
}
