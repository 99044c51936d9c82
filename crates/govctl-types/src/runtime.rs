//! Mutable runtime state owned by the Lifecycle Engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ActorId;

/// The packet lifecycle status, as transitioned by `govctl-kernel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketStatus {
    /// Not yet claimed; dependencies may or may not be satisfied.
    Pending,
    /// Claimed, awaiting preflight assessment and approval.
    Preflight,
    /// Claimed and actively being worked.
    InProgress,
    /// In progress but the heartbeat has lapsed beyond the stall threshold.
    Stalled,
    /// Submitted for two-person review.
    Review,
    /// Escalated — requires supervisor attention before any further transition.
    Escalated,
    /// Terminal: complete. No forward transitions are possible.
    Done,
    /// Terminal except for a lead-initiated `reset`.
    Failed,
    /// Blocked by a failed or blocked dependency; not itself terminal.
    Blocked,
}

impl PacketStatus {
    /// `true` for statuses that are terminal except for lead-only `reset`.
    pub fn is_reset_eligible(self) -> bool {
        matches!(
            self,
            PacketStatus::Failed | PacketStatus::Stalled | PacketStatus::Escalated | PacketStatus::Preflight
        )
    }
}

/// Structured preflight assessment payload required by `preflight(..)`.
///
/// All four fields are mandatory and must be non-empty (spec §4.H.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightAssessment {
    /// Confirmation that the executor has reviewed the required context.
    pub context_confirmation: String,
    /// Register of ambiguities identified before execution.
    pub ambiguity_register: String,
    /// Risk flags raised during preflight.
    pub risk_flags: String,
    /// The executor's intended plan of execution.
    pub execution_plan: String,
}

impl PreflightAssessment {
    /// Validate that no field is empty, per spec §4.H.2.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("context_confirmation", &self.context_confirmation),
            ("ambiguity_register", &self.ambiguity_register),
            ("risk_flags", &self.risk_flags),
            ("execution_plan", &self.execution_plan),
        ] {
            if value.trim().is_empty() {
                return Err(format!("preflight assessment field '{name}' must not be empty"));
            }
        }
        Ok(())
    }
}

/// Verdict recorded by a `review-submit` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewVerdict {
    /// Review passed; the packet transitions to `done`.
    Approve,
    /// Review failed; the packet returns to `in_progress` for rework.
    Reject,
    /// Reviewer defers the decision to a supervisor.
    Escalate,
}

/// Structured review assessment payload required by `review-submit(..)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAssessment {
    /// Assessment of each exit criterion in the packet definition.
    pub exit_criteria_assessment: String,
    /// Findings narrative.
    pub findings: String,
    /// Risk flags raised during review.
    pub risk_flags: String,
}

impl ReviewAssessment {
    /// Validate that no field is empty, per spec §4.H.7.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("exit_criteria_assessment", &self.exit_criteria_assessment),
            ("findings", &self.findings),
            ("risk_flags", &self.risk_flags),
        ] {
            if value.trim().is_empty() {
                return Err(format!("review assessment field '{name}' must not be empty"));
            }
        }
        Ok(())
    }
}

/// Structured heartbeat payload required by `heartbeat(..)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    /// Free-form status line.
    pub status: String,
    /// Decisions made since the last heartbeat.
    pub decisions: String,
    /// Obstacles encountered.
    pub obstacles: String,
    /// Estimated completion (free-form; e.g. "2h", "2026-08-01").
    pub completion_estimate: String,
}

impl HeartbeatPayload {
    /// Validate that all keys are present and non-empty, per spec §4.H.4.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("status", &self.status),
            ("decisions", &self.decisions),
            ("obstacles", &self.obstacles),
            ("completion_estimate", &self.completion_estimate),
        ] {
            if value.trim().is_empty() {
                return Err(format!("heartbeat payload field '{name}' must not be empty"));
            }
        }
        Ok(())
    }
}

/// Residual risk acknowledgement supplied with a `done(..)` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResidualRiskAck {
    /// No residual risk is being declared.
    None,
    /// A residual risk is declared with a structured description.
    Declared {
        /// Free-form description of the residual risk.
        description: String,
        /// Severity of the declared risk.
        severity: crate::risk::RiskSeverity,
    },
}

/// Mutable runtime state for a single packet, owned exclusively by the
/// Lifecycle Engine and keyed by packet id in the State Store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRuntimeState {
    /// Current lifecycle status.
    pub status: PacketStatus,
    /// Current owner (executor), non-empty while the packet is owned.
    #[serde(default)]
    pub assigned_to: Option<ActorId>,
    /// The reviewer that currently holds the review claim, if the packet is
    /// in (or has passed through) `review`. Cleared on `reset`.
    #[serde(default)]
    pub reviewer: Option<ActorId>,
    /// Evidence/notes narrative accumulated across the packet's lifetime.
    #[serde(default)]
    pub notes: Vec<String>,
    /// When the packet was first claimed.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the packet reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Timestamp of the last heartbeat.
    #[serde(default)]
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    /// Paths the executor attested to having read at claim time.
    #[serde(default)]
    pub context_attestation: Vec<String>,
    /// Latest preflight assessment, if any.
    #[serde(default)]
    pub preflight: Option<PreflightAssessment>,
    /// Latest review assessment, if any.
    #[serde(default)]
    pub review: Option<ReviewAssessment>,
    /// Residual risk acknowledgement from the last `done` transition.
    #[serde(default)]
    pub residual_risk: Option<ResidualRiskAck>,
    /// Latest heartbeat payload.
    #[serde(default)]
    pub heartbeat_payload: Option<HeartbeatPayload>,
    /// Link to the packet template this instance was created from, if any.
    #[serde(default)]
    pub template_link: Option<String>,
    /// Number of review reject cycles so far (spec §4.H.7 max-cycles rule).
    #[serde(default)]
    pub cycle_count: u32,
}

impl Default for PacketRuntimeState {
    fn default() -> Self {
        Self {
            status: PacketStatus::Pending,
            assigned_to: None,
            reviewer: None,
            notes: Vec::new(),
            started_at: None,
            completed_at: None,
            last_heartbeat_at: None,
            context_attestation: Vec::new(),
            preflight: None,
            review: None,
            residual_risk: None,
            heartbeat_payload: None,
            template_link: None,
            cycle_count: 0,
        }
    }
}

impl PacketRuntimeState {
    /// Construct the implicit first-touch state for a packet: `pending`,
    /// unowned, no history.
    pub fn pending() -> Self {
        Self::default()
    }
}
