//! Append-only lifecycle event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, PacketId};

/// The kind of governance action recorded in a [`LifecycleLogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A packet was claimed.
    Claimed,
    /// A preflight assessment was submitted.
    PreflightSubmitted,
    /// A preflight assessment was approved.
    PreflightApproved,
    /// A preflight assessment was returned to the executor.
    PreflightReturned,
    /// Execution started (no-preflight path).
    Started,
    /// A heartbeat was recorded.
    Heartbeat,
    /// The packet stalled due to a missed heartbeat.
    Stalled,
    /// The packet resumed from a stalled state.
    ResumedFromStalled,
    /// The packet was marked complete by its executor.
    Completed,
    /// A reviewer claimed the packet for review.
    ReviewClaimed,
    /// A review verdict was submitted.
    ReviewSubmitted,
    /// The packet was escalated.
    Escalated,
    /// The packet failed.
    Failed,
    /// The packet was reset to pending by a supervisor.
    Reset,
    /// A free-form note was appended.
    Noted,
    /// A level-2 area closeout was recorded.
    CloseoutL2,
    /// An ontology-advisory event was recorded (external collaborator).
    OntologyEvent,
    /// A template-related event was recorded.
    TemplateEvent,
    /// A packet was automatically transitioned to `blocked` because a
    /// dependency entered `failed` or `blocked` (dependency-gate
    /// propagation, spec §4.G; not directly invoked by an operator).
    Blocked,
    /// A previously `blocked` packet automatically returned to `pending`
    /// because none of its dependencies are `failed`/`blocked` anymore.
    Unblocked,
}

/// A single, monotonically ordered, append-only governance log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleLogEntry {
    /// UTC timestamp, nanosecond precision where available.
    pub timestamp: DateTime<Utc>,
    /// The packet this entry concerns. `None` for area-wide events
    /// (e.g. `closeout_l2`).
    #[serde(default)]
    pub packet_id: Option<PacketId>,
    /// The kind of event.
    pub event: LifecycleEvent,
    /// The actor that performed the action.
    pub actor: ActorId,
    /// Free-form structured details, preserved verbatim.
    #[serde(default)]
    pub details: serde_json::Value,
}
