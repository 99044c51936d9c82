//! Residual risk register.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActorId, PacketId};

/// Severity of a declared residual risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

/// Lifecycle status of a residual risk register entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    /// Still outstanding.
    Open,
    /// Addressed by follow-up work.
    Mitigated,
    /// Accepted as-is by a supervisor.
    Accepted,
}

/// One entry in the optional `risk-register.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRiskEntry {
    /// Unique entry identifier.
    pub id: uuid::Uuid,
    /// The packet the risk was declared against.
    pub packet_id: PacketId,
    /// Severity.
    pub severity: RiskSeverity,
    /// Current status.
    pub status: RiskStatus,
    /// Free-form description.
    pub description: String,
    /// The actor responsible for the risk.
    pub owner: ActorId,
    /// When the entry was opened.
    pub opened_at: DateTime<Utc>,
    /// When the entry was resolved (mitigated/accepted), if ever.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}
