//! The stable governance error surface (spec §7).
//!
//! Every operation in [`crate::Engine`] returns [`GovernanceError`]. Nothing
//! below this crate (`govctl-store`, `govctl-gate`, `govctl-defs`) is
//! expected to be matched on directly by a caller — this is the boundary
//! where internal plumbing errors get classified into the handful of kinds
//! an operator surface needs to report a sane exit code for.

use govctl_types::PacketStatus;

/// Why a requested lifecycle transition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTransitionReason {
    /// The packet's current status is not one the operation accepts.
    #[error("expected status {expected:?}, found {actual:?}")]
    WrongStatus {
        /// Status (or statuses) the operation requires.
        expected: &'static str,
        /// The packet's actual status.
        actual: PacketStatus,
    },
    /// The actor issuing the command is not permitted to act on this packet
    /// in this role (executor acting as their own reviewer, a non-assignee
    /// sending a heartbeat, etc.).
    #[error("identity conflict: {0}")]
    IdentityConflict(String),
    /// One or more declared dependencies are not yet `done`.
    #[error("dependencies not satisfied: {0:?}")]
    DependencyUnmet(Vec<String>),
    /// `claim` was issued without attesting to a required context file.
    #[error("missing context attestation for: {0:?}")]
    ContextAttestationMissing(Vec<String>),
    /// `done`/`review-submit` was issued without required evidence.
    #[error("missing evidence: {0}")]
    EvidenceMissing(String),
}

/// The stable error surface every `govctl-kernel` operation returns.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// Malformed command input (missing/invalid argument), caller's fault,
    /// nothing was touched on disk.
    #[error("usage error: {0}")]
    Usage(String),

    /// A definition or request body failed schema validation.
    #[error("schema invalid: {0}")]
    SchemaInvalid(String),

    /// The referenced packet, area, commit, or checkpoint does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested transition is not legal from the packet's current
    /// state, or a precondition (identity, dependency, evidence) failed.
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransitionReason),

    /// Another writer holds the lock this operation needed, and the
    /// bounded retry budget was exhausted.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The on-disk DCL failed a verification check (hash mismatch, HEAD
    /// drift, broken chain linkage) that this operation would otherwise
    /// have built on top of.
    #[error("integrity failure: {0}")]
    IntegrityFailure(String),

    /// Unclassified I/O failure from the persistence substrate.
    #[error("io error: {0}")]
    Io(govctl_store::StoreError),
}

impl GovernanceError {
    /// Machine-readable error code surfaced in the CLI's
    /// `GovernanceReport` envelope and used to pick a process exit code.
    pub fn code(&self) -> &'static str {
        match self {
            GovernanceError::Usage(_) => "usage",
            GovernanceError::SchemaInvalid(_) => "schema_invalid",
            GovernanceError::NotFound(_) => "not_found",
            GovernanceError::InvalidTransition(_) => "invalid_transition",
            GovernanceError::ConcurrencyConflict(_) => "concurrency_conflict",
            GovernanceError::IntegrityFailure(_) => "integrity_failure",
            GovernanceError::Io(_) => "io_error",
        }
    }

    /// Process exit code per spec §6's operator command table: 2 usage, 3
    /// governance rejection, 4 precondition missing (dependency unmet), 5
    /// integrity failure. Only `claim` can return 4 — every other mutating
    /// command's table entry lists `0/3` because `DependencyUnmet` is only
    /// ever raised by `claim`.
    pub fn exit_code(&self) -> i32 {
        match self {
            GovernanceError::Usage(_) | GovernanceError::SchemaInvalid(_) => 2,
            GovernanceError::InvalidTransition(InvalidTransitionReason::DependencyUnmet(_)) => 4,
            GovernanceError::NotFound(_)
            | GovernanceError::InvalidTransition(_)
            | GovernanceError::ConcurrencyConflict(_) => 3,
            GovernanceError::IntegrityFailure(_) => 5,
            GovernanceError::Io(_) => 5,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Classifies a store-layer failure rather than blanket-wrapping it: lock
/// contention is a `ConcurrencyConflict` (spec §7 says the operator may
/// retry it), a corrupt journal or chain is an `IntegrityFailure`, a
/// missing packet/commit/checkpoint is `NotFound`, and everything else
/// (raw I/O, canonicalization, serde) is the catch-all `Io`.
impl From<govctl_store::StoreError> for GovernanceError {
    fn from(e: govctl_store::StoreError) -> Self {
        let detail = e.to_string();
        match e {
            govctl_store::StoreError::LockContention(detail) => GovernanceError::ConcurrencyConflict(detail),
            govctl_store::StoreError::JournalCorrupt { .. } | govctl_store::StoreError::ChainCorrupt { .. } => {
                GovernanceError::IntegrityFailure(detail)
            }
            govctl_store::StoreError::NotFound(detail) => GovernanceError::NotFound(detail),
            other => GovernanceError::Io(other),
        }
    }
}

impl From<govctl_gate::GateError> for GovernanceError {
    fn from(e: govctl_gate::GateError) -> Self {
        GovernanceError::SchemaInvalid(e.to_string())
    }
}

impl From<govctl_defs::DefsError> for GovernanceError {
    fn from(e: govctl_defs::DefsError) -> Self {
        match e {
            govctl_defs::DefsError::Io(io) => GovernanceError::Io(io.into()),
            other => GovernanceError::SchemaInvalid(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GovernanceError {
    fn from(e: serde_json::Error) -> Self {
        GovernanceError::SchemaInvalid(e.to_string())
    }
}

impl From<std::io::Error> for GovernanceError {
    fn from(e: std::io::Error) -> Self {
        GovernanceError::Io(e.into())
    }
}
