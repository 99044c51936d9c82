//! Immutable work-area and packet definitions, loaded once at process start.

use serde::{Deserialize, Serialize};

use crate::{AreaId, PacketId};

/// A named grouping of packets supporting level-2 closeout.
///
/// `WorkArea` is immutable after load; mutation requires out-of-band
/// definition replacement and re-initialization (spec invariant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkArea {
    /// Unique area identifier.
    pub id: AreaId,
    /// Display title.
    pub title: String,
    /// Human-readable description.
    pub description: String,
    /// Packets that belong to this area.
    pub packets: Vec<PacketId>,
}

/// One `{file, priority, required}` entry in a packet's context manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextManifestEntry {
    /// Path of the context file the executor must read.
    pub file: String,
    /// Relative priority among manifest entries (lower sorts first).
    pub priority: u32,
    /// Whether the executor must attest to having read this file before
    /// claiming the packet.
    pub required: bool,
}

/// A governed unit of work with a lifecycle.
///
/// `PacketDefinition` is immutable once loaded (spec invariant): all mutable
/// state lives in [`crate::runtime::PacketRuntimeState`], keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketDefinition {
    /// Unique packet identifier, stable across the packet's lifetime.
    pub id: PacketId,
    /// Display reference into the work-breakdown structure (e.g. `"2.3.1"`).
    pub wbs_ref: String,
    /// The area this packet belongs to.
    pub area_id: AreaId,
    /// Human-readable title.
    pub title: String,
    /// Scope description.
    pub scope: String,
    /// Preconditions that must hold before claiming.
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Actions the executor is required to perform.
    #[serde(default)]
    pub required_actions: Vec<String>,
    /// Outputs the executor is required to produce.
    #[serde(default)]
    pub required_outputs: Vec<String>,
    /// Checks used to validate the outputs.
    #[serde(default)]
    pub validation_checks: Vec<String>,
    /// Criteria that must be satisfied for the packet to be considered done.
    #[serde(default)]
    pub exit_criteria: Vec<String>,
    /// Conditions under which the packet must be halted/failed.
    #[serde(default)]
    pub halt_conditions: Vec<String>,
    /// Other packet ids this packet depends on.
    #[serde(default)]
    pub dependencies: Vec<PacketId>,

    /// Whether a `preflight` assessment gate is required before execution.
    #[serde(default)]
    pub preflight_required: bool,
    /// Whether a two-person `review` gate is required before completion.
    #[serde(default)]
    pub review_required: bool,
    /// Whether the executor must send periodic heartbeats.
    #[serde(default)]
    pub heartbeat_required: bool,
    /// Heartbeat cadence, if `heartbeat_required` is set.
    #[serde(default)]
    pub heartbeat_interval_seconds: Option<u64>,
    /// Files the executor must read before claiming, with priority/required flags.
    #[serde(default)]
    pub context_manifest: Vec<ContextManifestEntry>,
    /// Optional reference to a reusable packet template.
    #[serde(default)]
    pub template_ref: Option<String>,
    /// Whether ontology-advisory checks are required (advisory only; the
    /// ontology checker itself is an external collaborator — spec §1).
    #[serde(default)]
    pub ontology_required: bool,
}

impl PacketDefinition {
    /// The subset of `context_manifest` entries that require an explicit
    /// context attestation at claim time.
    pub fn required_context_files(&self) -> impl Iterator<Item = &str> {
        self.context_manifest
            .iter()
            .filter(|entry| entry.required)
            .map(|entry| entry.file.as_str())
    }
}
