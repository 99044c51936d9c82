//! The six named integrity failure modes (spec §4.I) plus the store/defs
//! plumbing errors a verify/doctor run can surface.

use serde::{Deserialize, Serialize};

/// A single integrity violation detected by [`crate::verifier::Verifier`] or
/// [`crate::doctor::Doctor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum VerifyError {
    /// Commit `seq` numbers are not dense and monotone starting at 1.
    #[error("packet '{packet_id}': sequence discontinuity, expected seq {expected}, found {found}")]
    ErrSeqDiscontinuity {
        /// Packet whose chain has a gap.
        packet_id: String,
        /// The seq the next commit should have had.
        expected: u64,
        /// The seq it actually had.
        found: u64,
    },
    /// `commit[n].prev_commit_hash != commit[n-1].commit_hash`.
    #[error("packet '{packet_id}': prev_commit_hash mismatch at seq {seq}")]
    ErrPrevHashMismatch {
        /// Packet with the broken chain link.
        packet_id: String,
        /// Sequence number at which the link breaks.
        seq: u64,
    },
    /// `commit[n].pre_state_hash != commit[n-1].post_state_hash`.
    #[error("packet '{packet_id}': pre_state_hash does not match predecessor's post_state_hash at seq {seq}")]
    ErrStateHashMismatch {
        /// Packet with the broken state-hash continuity.
        packet_id: String,
        /// Sequence number at which the discontinuity was found.
        seq: u64,
    },
    /// `HEAD` does not equal the last commit's `{seq, commit_hash}`.
    #[error("packet '{packet_id}': HEAD has drifted from the last commit")]
    ErrHeadDrift {
        /// Packet whose HEAD pointer is stale or absent.
        packet_id: String,
    },
    /// A commit's stored `commit_hash` does not match its recomputed
    /// canonical hash.
    #[error("packet '{packet_id}': commit_hash mismatch at seq {seq}")]
    ErrCommitHashMismatch {
        /// Packet with the tampered or corrupt commit.
        packet_id: String,
        /// Sequence number of the offending commit.
        seq: u64,
    },
    /// `SHA256(canonical(runtime_state(p))) != HEAD.post_state_hash`.
    #[error("packet '{packet_id}': runtime state does not bind to HEAD.post_state_hash")]
    ErrRuntimeBindingMismatch {
        /// Packet whose on-disk runtime state disagrees with its HEAD.
        packet_id: String,
    },
    /// The latest project checkpoint's `head_table` no longer matches the
    /// current HEAD of every packet it recorded.
    #[error("checkpoint '{checkpoint_id}' has drifted from current HEADs")]
    ErrCheckpointDrift {
        /// The stale checkpoint.
        checkpoint_id: String,
    },
}

impl VerifyError {
    /// Machine-readable failure code, as named by spec §4.I.
    pub fn code(&self) -> &'static str {
        match self {
            VerifyError::ErrSeqDiscontinuity { .. } => "ErrSeqDiscontinuity",
            VerifyError::ErrPrevHashMismatch { .. } => "ErrPrevHashMismatch",
            VerifyError::ErrStateHashMismatch { .. } => "ErrStateHashMismatch",
            VerifyError::ErrHeadDrift { .. } => "ErrHeadDrift",
            VerifyError::ErrCommitHashMismatch { .. } => "ErrCommitHashMismatch",
            VerifyError::ErrRuntimeBindingMismatch { .. } => "ErrRuntimeBindingMismatch",
            VerifyError::ErrCheckpointDrift { .. } => "ErrCheckpointDrift",
        }
    }
}

/// Plumbing failure: the store or definition layer itself errored out
/// before a verification pass could even run. Kept distinct from
/// [`VerifyError`] so a caller can tell "your history is corrupt" apart
/// from "I/O failed while trying to read it".
#[derive(Debug, thiserror::Error)]
pub enum VerifyRunError {
    /// Reading the definition document failed.
    #[error("definition error: {0}")]
    Defs(#[from] govctl_defs::DefsError),
    /// Reading from the persistence substrate failed.
    #[error("store error: {0}")]
    Store(#[from] govctl_store::StoreError),
    /// Canonicalization failed while hashing for comparison.
    #[error("canonicalization error: {0}")]
    Canon(#[from] govctl_canon::CanonError),
    /// Serializing a report to JSON failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience alias used throughout this crate.
pub type VerifyResult<T> = Result<T, VerifyRunError>;
