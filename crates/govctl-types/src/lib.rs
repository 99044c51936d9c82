#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-types** – Shared primitive data structures for the govctl
//! governance control plane.
//!
//! The crate is dependency-light and sits at the very bottom of the crate
//! graph so that every other crate can depend on it without causing cycles.
//! It makes no assumptions about I/O, hashing, or persistence — those live
//! in `govctl-canon` and `govctl-store`.

use serde::{Deserialize, Serialize};

/// Definitions: `WorkArea`, `PacketDefinition` and the immutable load-time
/// schema they form.
pub mod definition;
/// Mutable runtime state owned by the Lifecycle Engine.
pub mod runtime;
/// Append-only lifecycle log entries.
pub mod log;
/// Deterministic Commitment Layer records: commits, heads, journals, checkpoints.
pub mod commit;
/// Residual risk register entries.
pub mod risk;

pub use definition::{ContextManifestEntry, PacketDefinition, WorkArea};
pub use runtime::{
    HeartbeatPayload, PacketRuntimeState, PacketStatus, PreflightAssessment, ResidualRiskAck,
    ReviewAssessment, ReviewVerdict,
};
pub use log::{LifecycleEvent, LifecycleLogEntry};
pub use commit::{ActionEnvelope, DclCommit, Head, Journal, JournalPhase, ProjectCheckpoint, GENESIS};
pub use risk::{ResidualRiskEntry, RiskSeverity, RiskStatus};

//─────────────────────────────
//  Core identifiers
//─────────────────────────────

/// Identifier of a [`PacketDefinition`] / [`PacketRuntimeState`] pair.
///
/// Packet ids are assigned at definition time and never reused; they are
/// opaque strings rather than UUIDs because operators author them by hand in
/// `definition.json` (e.g. `"wbs-2.3.1"`).
pub type PacketId = String;

/// Identifier of a [`WorkArea`].
pub type AreaId = String;

/// Identity of an actor performing a governance action (executor, reviewer,
/// supervisor, or observer). Opaque string, compared by equality only.
pub type ActorId = String;

//─────────────────────────────
//  Security / size limits
//─────────────────────────────

/// Maximum allowed length for free-form narrative fields (evidence, notes,
/// reasons) to prevent unbounded growth of the on-disk state document.
pub const MAX_NARRATIVE_LEN: usize = 65_536;

/// Maximum allowed length for an actor identity string.
pub const MAX_ACTOR_ID_LEN: usize = 256;

//─────────────────────────────
//  Shared validation helper
//─────────────────────────────

/// Validate that a narrative string is non-empty and within bounds.
///
/// Shared by several operations in `govctl-kernel` (`done` evidence, `note`
/// text, `fail` reason) that all require a non-empty, bounded narrative.
pub fn validate_narrative(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.len() > MAX_NARRATIVE_LEN {
        return Err(format!(
            "{field} exceeds maximum length: {} > {}",
            value.len(),
            MAX_NARRATIVE_LEN
        ));
    }
    Ok(())
}

/// Validate an actor identity string.
pub fn validate_actor(actor: &str) -> Result<(), String> {
    if actor.trim().is_empty() {
        return Err("actor identity must not be empty".to_string());
    }
    if actor.len() > MAX_ACTOR_ID_LEN {
        return Err(format!(
            "actor identity exceeds maximum length: {} > {}",
            actor.len(),
            MAX_ACTOR_ID_LEN
        ));
    }
    Ok(())
}

/// Convenience prelude for importing the most common types.
pub mod prelude {
    pub use super::{
        commit::{ActionEnvelope, DclCommit, Head, Journal, JournalPhase, ProjectCheckpoint, GENESIS},
        definition::{ContextManifestEntry, PacketDefinition, WorkArea},
        log::{LifecycleEvent, LifecycleLogEntry},
        risk::{ResidualRiskEntry, RiskSeverity, RiskStatus},
        runtime::{
            HeartbeatPayload, PacketRuntimeState, PacketStatus, PreflightAssessment,
            ResidualRiskAck, ReviewAssessment, ReviewVerdict,
        },
        ActorId, AreaId, PacketId,
    };
}

/// Marker used by `serde(tag = "type")` enums to carry forward-compatible
/// free-form data alongside their typed fields (spec's "typed extra map").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extra(pub serde_json::Map<String, serde_json::Value>);
