//! Structured report shapes returned by the Verifier and Doctor, suitable
//! for direct JSON rendering by `govctl-cli`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use govctl_types::{DclCommit, PacketDefinition, PacketId, PacketRuntimeState};

use crate::error::VerifyError;

/// Result of verifying a single packet's commit chain (spec §4.I `verify`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketVerification {
    /// The packet verified.
    pub packet_id: PacketId,
    /// `true` iff `failures` is empty.
    pub ok: bool,
    /// Number of commits in the chain at verification time.
    pub commit_count: usize,
    /// Every violation found, in the order detected.
    pub failures: Vec<VerifyError>,
}

/// Result of `verify --all` (spec §4.I): every packet with a chain, plus
/// the latest checkpoint if one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAllReport {
    /// `true` iff every packet verified ok and the checkpoint (if any)
    /// matches current HEADs.
    pub ok: bool,
    /// Per-packet results, ordered by packet id.
    pub packets: Vec<PacketVerification>,
    /// Checkpoint drift, if a checkpoint exists and no longer matches.
    pub checkpoint_failure: Option<VerifyError>,
}

/// A self-contained proof export (spec §4.I `export-proof`): everything
/// needed to independently re-verify one packet's history without the
/// rest of the governance root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofManifest {
    /// The packet this proof covers.
    pub packet_id: PacketId,
    /// When the export was produced.
    pub exported_at: DateTime<Utc>,
    /// The packet's immutable definition, as loaded at export time.
    pub definition_excerpt: PacketDefinition,
    /// The full commit chain, seq ascending.
    pub commits: Vec<DclCommit>,
    /// Raw bytes of `constitution.txt` at export time, UTF-8 lossily
    /// decoded for embedding in a JSON manifest.
    pub constitution_snapshot: String,
    /// Current runtime state for the packet.
    pub runtime_state: PacketRuntimeState,
    /// SHA-256 over the canonical form of this manifest with this field
    /// blanked — lets any third party re-derive and compare it without
    /// access to the original root.
    pub manifest_hash: String,
}

/// One finding from a [`crate::doctor::Doctor`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorFailure {
    /// Packet the finding concerns, `None` for a root-level finding
    /// (missing or drifted `dcl-config.json`, checkpoint drift).
    pub packet_id: Option<PacketId>,
    /// The underlying violation, if this finding came from a verify pass.
    pub error: Option<VerifyError>,
    /// Free-form description for findings that aren't a [`VerifyError`]
    /// (missing dcl-config, recovered journal).
    pub detail: String,
}

/// Structured doctor report (spec §4.J): `{ok, packet_count, commit_count,
/// checkpoint_count, failures[]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorReport {
    /// `true` iff `failures` is empty.
    pub ok: bool,
    /// `"fast"` or `"full"`.
    pub mode: String,
    /// Number of packets with at least one commit.
    pub packet_count: usize,
    /// Total commits across every packet.
    pub commit_count: usize,
    /// Number of project checkpoints on disk.
    pub checkpoint_count: usize,
    /// Every finding, recovery action, and integrity violation observed.
    pub failures: Vec<DoctorFailure>,
}
