use std::io;

/// Errors raised by the persistence substrate.
///
/// `govctl-kernel` wraps this type into its own `GovernanceError::Io` /
/// `GovernanceError::IntegrityFailure` variants via `#[from]`; callers below
/// the kernel should treat every variant here as already-classified.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error. Whether this is transient or fatal is a decision
    /// for the caller (`govctl-kernel` retries transient `Io` per spec §7);
    /// this crate does not guess.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A value failed to canonicalize (non-finite float, etc.).
    #[error("canonicalization error: {0}")]
    Canon(#[from] govctl_canon::CanonError),

    /// A stored document failed to (de)serialize as JSON.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The requested packet, commit, or checkpoint does not exist on disk.
    #[error("not found: {0}")]
    NotFound(String),

    /// `journal.json` exists but is neither well-formed nor in a recognized
    /// phase; recovery cannot proceed automatically.
    #[error("journal corrupt for packet {packet_id}: {detail}")]
    JournalCorrupt {
        /// Packet whose journal failed to parse.
        packet_id: String,
        /// What was wrong with it.
        detail: String,
    },

    /// A commit file exists but its `commit_hash` does not match its own
    /// canonical contents, or the chain linkage is broken.
    #[error("commit chain corrupt for packet {packet_id} at seq {seq}: {detail}")]
    ChainCorrupt {
        /// Packet whose chain is broken.
        packet_id: String,
        /// Sequence number where the break was detected.
        seq: u64,
        /// Description of the mismatch.
        detail: String,
    },

    /// An advisory lock could not be acquired within the retry budget.
    #[error("lock contention on {0}")]
    LockContention(String),
}

/// Convenience alias used throughout this crate.
pub type StoreResult<T> = Result<T, StoreError>;
