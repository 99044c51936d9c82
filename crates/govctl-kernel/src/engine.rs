//! The Lifecycle Engine (spec §4.H): every operator operation, the packet
//! status transition table, and the atomic commit/state/log write that
//! backs each one.
//!
//! Grounded on `toka-kernel::Kernel::submit`'s validate-then-dispatch-then-
//! emit shape, generalized from one capability-gated call into an
//! operation table and from an in-memory `WorldState` to the on-disk
//! `StateStore`/`CommitStore` pair.

use std::fs;
use std::path::Path;

use chrono::Utc;
use govctl_defs::Definitions;
use govctl_store::{CheckpointStore, CommitStore, LifecycleLog, RiskRegisterStore, StateDocument, StateStore};
use govctl_types::{
    ActionEnvelope, DclCommit, HeartbeatPayload, LifecycleEvent, LifecycleLogEntry, PacketId, PacketRuntimeState,
    PacketStatus, PreflightAssessment, ProjectCheckpoint, ResidualRiskAck, ResidualRiskEntry, ReviewAssessment,
    ReviewVerdict, RiskStatus,
};

use crate::config::EngineConfig;
use crate::diff::diff_runtime_state;
use crate::error::{GovernanceError, GovernanceResult, InvalidTransitionReason};

/// Bundles the Definition Loader, every persistence store, and the timing
/// configuration the Lifecycle Engine needs to evaluate and commit a
/// transition. Stateless beyond what's on disk: an `Engine` can be dropped
/// and rebuilt from the same root at any time.
pub struct Engine {
    definitions: Definitions,
    state_store: StateStore,
    commit_store: CommitStore,
    lifecycle_log: LifecycleLog,
    checkpoint_store: CheckpointStore,
    risk_register: RiskRegisterStore,
    config: EngineConfig,
    constitution_hash: String,
}

impl Engine {
    /// Open the engine rooted at `root` (the directory containing
    /// `definition.json`), loading and validating the definition document.
    pub fn open(root: impl AsRef<Path>, config: EngineConfig) -> GovernanceResult<Self> {
        let root = root.as_ref();
        let definition_path = root.join("definition.json");
        let definitions = Definitions::load(&definition_path)?;

        let constitution_path = root.join("constitution.txt");
        let constitution_raw = fs::read(&constitution_path).unwrap_or_default();
        let constitution_hash = govctl_canon::sha256_hex(&constitution_raw);

        Ok(Self {
            definitions,
            state_store: StateStore::new(root),
            commit_store: CommitStore::new(root),
            lifecycle_log: LifecycleLog::new(root),
            checkpoint_store: CheckpointStore::new(root),
            risk_register: RiskRegisterStore::new(root),
            config,
            constitution_hash,
        })
    }

    /// The loaded, validated definition schema.
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// The effective timing configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Packets ready to be claimed right now, `(area_id, wbs_ref)` ordered.
    pub fn ready(&self) -> GovernanceResult<Vec<PacketId>> {
        let doc = self.state_store.load()?;
        Ok(self.definitions.dependency_index().ready_ids(&doc.packets))
    }

    /// Current runtime state for one packet, `None` if never touched.
    pub fn status(&self, packet_id: &str) -> GovernanceResult<Option<PacketRuntimeState>> {
        let doc = self.state_store.load()?;
        Ok(doc.packets.get(packet_id).cloned())
    }

    /// Current runtime state for every packet that has been touched at
    /// least once, keyed by packet id. Backs the no-argument `status`
    /// operator command (spec §6).
    pub fn all_status(&self) -> GovernanceResult<std::collections::BTreeMap<PacketId, PacketRuntimeState>> {
        let doc = self.state_store.load()?;
        Ok(doc.packets)
    }

    fn require_definition(&self, packet_id: &str) -> GovernanceResult<&govctl_types::PacketDefinition> {
        self.definitions
            .packet(packet_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("packet '{packet_id}'")))
    }

    fn pre_state(doc: &StateDocument, packet_id: &str) -> PacketRuntimeState {
        doc.packets.get(packet_id).cloned().unwrap_or_else(PacketRuntimeState::pending)
    }

    /// Common tail of every packet-scoped operation: diff, commit, update
    /// the state document, recompute dependency-gate propagation, persist
    /// everything under the already-held global lock, and log.
    #[allow(clippy::too_many_arguments)]
    fn commit_transition(
        &self,
        doc: &mut StateDocument,
        packet_id: &str,
        pre: &PacketRuntimeState,
        post: PacketRuntimeState,
        event: LifecycleEvent,
        actor: &str,
        inputs: serde_json::Value,
    ) -> GovernanceResult<DclCommit> {
        let now = Utc::now();
        let pre_state_hash = govctl_canon::hash_value(pre)?;
        let post_state_hash = govctl_canon::hash_value(&post)?;
        let action_envelope = ActionEnvelope {
            event,
            actor: actor.to_string(),
            inputs,
            timestamp: now,
        };
        let action_hash = govctl_canon::hash_value(&action_envelope)?;
        let diff = diff_runtime_state(pre, &post);
        let constitution_hash = self.constitution_hash.clone();

        let commit = self.commit_store.append_commit(packet_id, move |seq, prev_commit_hash| {
            let mut commit = DclCommit {
                commit_id: uuid::Uuid::new_v4(),
                packet_id: packet_id.to_string(),
                seq,
                prev_commit_hash,
                action_hash,
                pre_state_hash,
                post_state_hash,
                constitution_hash,
                diff,
                created_at: now,
                action_envelope,
                commit_hash: String::new(),
            };
            commit.commit_hash = govctl_store::compute_commit_hash(&commit)?;
            Ok(commit)
        })?;

        doc.packets.insert(packet_id.to_string(), post);

        self.lifecycle_log.append(&LifecycleLogEntry {
            timestamp: now,
            packet_id: Some(packet_id.to_string()),
            event: commit.action_envelope.event,
            actor: actor.to_string(),
            details: commit.action_envelope.inputs.clone(),
        })?;

        tracing::info!(packet_id, actor, event = ?commit.action_envelope.event, seq = commit.seq, "committed lifecycle transition");
        Ok(commit)
    }

    /// Recompute dependency-gate blocked/pending propagation after a
    /// status-affecting transition and commit one `Blocked`/`Unblocked`
    /// sub-transition per dependent packet whose status actually flipped.
    /// Every cascaded commit is produced while the caller still holds the
    /// global state lock, in ascending packet-id order, alongside the
    /// triggering operation's own commit.
    fn propagate(&self, doc: &mut StateDocument) -> GovernanceResult<()> {
        let mut working = doc.packets.clone();
        let mut changed = self.definitions.dependency_index().recompute_propagation(&mut working);
        changed.sort();

        for packet_id in changed.drain(..) {
            let pre = Self::pre_state(doc, &packet_id);
            let post = working.get(&packet_id).cloned().unwrap_or_else(PacketRuntimeState::pending);
            if post.status == pre.status {
                continue;
            }
            let event = match post.status {
                PacketStatus::Blocked => LifecycleEvent::Blocked,
                _ => LifecycleEvent::Unblocked,
            };
            self.commit_transition(doc, &packet_id, &pre, post, event, "system", serde_json::json!({}))?;
        }
        Ok(())
    }

    fn maybe_register_residual_risk(&self, packet_id: &str, actor: &str, post: &PacketRuntimeState) -> GovernanceResult<()> {
        if let Some(ResidualRiskAck::Declared { description, severity }) = &post.residual_risk {
            self.risk_register.append(ResidualRiskEntry {
                id: uuid::Uuid::new_v4(),
                packet_id: packet_id.to_string(),
                severity: *severity,
                status: RiskStatus::Open,
                description: description.clone(),
                owner: actor.to_string(),
                opened_at: Utc::now(),
                resolved_at: None,
            })?;
        }
        Ok(())
    }

    /// `claim` (spec §4.H.1): move a ready `pending` packet to `preflight`
    /// or `in_progress`, recording the executor's context attestation.
    pub fn claim(&self, packet_id: &str, actor: &str, context_attestation: Vec<String>) -> GovernanceResult<DclCommit> {
        govctl_types::validate_actor(actor).map_err(GovernanceError::SchemaInvalid)?;
        let def = self.require_definition(packet_id)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Pending {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "pending",
                actual: pre.status,
            }
            .into());
        }
        if !self.definitions.dependency_index().is_ready(packet_id, &doc.packets) {
            let unmet: Vec<String> = self
                .definitions
                .dependency_index()
                .dependencies_of(packet_id)
                .iter()
                .filter(|dep| doc.packets.get(*dep).map(|s| s.status) != Some(PacketStatus::Done))
                .cloned()
                .collect();
            return Err(InvalidTransitionReason::DependencyUnmet(unmet).into());
        }
        let missing: Vec<String> = def
            .required_context_files()
            .filter(|f| !context_attestation.iter().any(|a| a == f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InvalidTransitionReason::ContextAttestationMissing(missing).into());
        }

        let mut post = pre.clone();
        post.assigned_to = Some(actor.to_string());
        post.started_at = Some(Utc::now());
        post.context_attestation = context_attestation.clone();
        post.status = if def.preflight_required {
            PacketStatus::Preflight
        } else {
            PacketStatus::InProgress
        };

        let inputs = serde_json::json!({ "context_attestation": context_attestation });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::Claimed, actor, inputs)?;
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `preflight` (spec §4.H.2): executor submits the mandatory assessment.
    pub fn preflight(&self, packet_id: &str, actor: &str, assessment: PreflightAssessment) -> GovernanceResult<DclCommit> {
        assessment.validate().map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Preflight {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "preflight",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() != Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict(
                "only the assigned executor may submit a preflight assessment".to_string(),
            )
            .into());
        }

        let mut post = pre.clone();
        post.preflight = Some(assessment.clone());

        let inputs = serde_json::to_value(&assessment)?;
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::PreflightSubmitted, actor, inputs)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `preflight-approve` (spec §4.H.3): supervisor clears the packet to
    /// begin execution.
    pub fn preflight_approve(&self, packet_id: &str, actor: &str) -> GovernanceResult<DclCommit> {
        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Preflight {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "preflight",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() == Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("the assigned executor may not approve their own preflight".to_string()).into());
        }
        if pre.preflight.is_none() {
            return Err(InvalidTransitionReason::EvidenceMissing("preflight assessment not yet submitted".to_string()).into());
        }

        let mut post = pre.clone();
        post.status = PacketStatus::InProgress;

        let commit = self.commit_transition(
            &mut doc,
            packet_id,
            &pre,
            post,
            LifecycleEvent::PreflightApproved,
            actor,
            serde_json::json!({}),
        )?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// Derives the `post` state shared by `preflight-return` and its
    /// automatic timeout counterpart in [`Self::check_stalled`]: clears the
    /// assessment and returns the packet to `pending` with no owner (spec
    /// §4.H.3 "return → pending (assigned_to cleared)").
    fn preflight_returned_state(pre: &PacketRuntimeState) -> PacketRuntimeState {
        let mut post = pre.clone();
        post.preflight = None;
        post.status = PacketStatus::Pending;
        post.assigned_to = None;
        post
    }

    /// `preflight-return` (spec §4.H.3): supervisor sends the assessment
    /// back to the executor for revision. The automatic timeout path lives
    /// in [`Self::check_stalled`] and shares [`Self::preflight_returned_state`].
    pub fn preflight_return(&self, packet_id: &str, actor: &str, reason: String) -> GovernanceResult<DclCommit> {
        govctl_types::validate_narrative("reason", &reason).map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Preflight {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "preflight",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() == Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("the assigned executor may not return their own preflight".to_string()).into());
        }

        let post = Self::preflight_returned_state(&pre);

        let inputs = serde_json::json!({ "reason": reason });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::PreflightReturned, actor, inputs)?;
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `heartbeat` (spec §4.H.4): executor reports liveness; resumes a
    /// `stalled` packet if one was sent late.
    pub fn heartbeat(&self, packet_id: &str, actor: &str, payload: HeartbeatPayload) -> GovernanceResult<DclCommit> {
        payload.validate().map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if !matches!(pre.status, PacketStatus::InProgress | PacketStatus::Stalled) {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "in_progress or stalled",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() != Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("only the assigned executor may heartbeat".to_string()).into());
        }

        let was_stalled = pre.status == PacketStatus::Stalled;
        let mut post = pre.clone();
        post.last_heartbeat_at = Some(Utc::now());
        post.heartbeat_payload = Some(payload.clone());
        if was_stalled {
            post.status = PacketStatus::InProgress;
        }

        let event = if was_stalled {
            LifecycleEvent::ResumedFromStalled
        } else {
            LifecycleEvent::Heartbeat
        };
        let inputs = serde_json::to_value(&payload)?;
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, event, actor, inputs)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `check-stalled` (spec §4.H.5 / §4.H.3 timeout rule): system-triggered
    /// staleness sweep for one packet. Returns `None` if the packet is not
    /// currently stale. Covers both a lapsed heartbeat in `in_progress` and
    /// an overdue preflight in `preflight`.
    pub fn check_stalled(&self, packet_id: &str) -> GovernanceResult<Option<DclCommit>> {
        let def = self.require_definition(packet_id)?;
        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);
        let now = Utc::now();

        match pre.status {
            PacketStatus::InProgress => {
                let threshold = match def.heartbeat_interval_seconds {
                    Some(interval) => EngineConfig::default_stall_threshold(interval),
                    None => self.config.stall_threshold_seconds,
                };
                let last = pre.last_heartbeat_at.or(pre.started_at).unwrap_or(now);
                let elapsed = (now - last).num_seconds().max(0) as u64;
                if elapsed <= threshold {
                    return Ok(None);
                }
                let mut post = pre.clone();
                post.status = PacketStatus::Stalled;
                let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::Stalled, "system", serde_json::json!({ "elapsed_seconds": elapsed }))?;
                self.propagate(&mut doc)?;
                self.state_store.save(&doc)?;
                Ok(Some(commit))
            }
            PacketStatus::Preflight => {
                let last = pre.started_at.unwrap_or(now);
                let elapsed = (now - last).num_seconds().max(0) as u64;
                if elapsed <= self.config.preflight_timeout_seconds {
                    return Ok(None);
                }
                let post = Self::preflight_returned_state(&pre);
                let commit = self.commit_transition(
                    &mut doc,
                    packet_id,
                    &pre,
                    post,
                    LifecycleEvent::PreflightReturned,
                    "system",
                    serde_json::json!({ "reason": "preflight timeout", "elapsed_seconds": elapsed }),
                )?;
                self.propagate(&mut doc)?;
                self.state_store.save(&doc)?;
                Ok(Some(commit))
            }
            _ => Ok(None),
        }
    }

    /// `done` (spec §4.H.6): executor declares the packet complete. Moves
    /// straight to `done` if no review is required, otherwise to `review`.
    pub fn done(
        &self,
        packet_id: &str,
        actor: &str,
        evidence: String,
        residual_risk_ack: ResidualRiskAck,
    ) -> GovernanceResult<DclCommit> {
        govctl_types::validate_narrative("evidence", &evidence).map_err(GovernanceError::SchemaInvalid)?;
        let def = self.require_definition(packet_id)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::InProgress {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "in_progress",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() != Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("only the assigned executor may mark a packet done".to_string()).into());
        }

        let mut post = pre.clone();
        post.notes.push(evidence.clone());
        post.residual_risk = Some(residual_risk_ack.clone());
        post.status = if def.review_required {
            PacketStatus::Review
        } else {
            post.completed_at = Some(Utc::now());
            PacketStatus::Done
        };

        let inputs = serde_json::json!({ "evidence": evidence, "residual_risk_ack": residual_risk_ack });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post.clone(), LifecycleEvent::Completed, actor, inputs)?;
        if post.status == PacketStatus::Done {
            self.maybe_register_residual_risk(packet_id, actor, &post)?;
        }
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `review-claim` (spec §4.H.7): a reviewer other than the executor
    /// takes ownership of the review.
    pub fn review_claim(&self, packet_id: &str, actor: &str) -> GovernanceResult<DclCommit> {
        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Review {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "review",
                actual: pre.status,
            }
            .into());
        }
        if pre.assigned_to.as_deref() == Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("the executor may not review their own packet".to_string()).into());
        }
        if let Some(existing) = &pre.reviewer {
            if existing != actor {
                return Err(InvalidTransitionReason::IdentityConflict(format!("already claimed by reviewer '{existing}'")).into());
            }
        }

        let mut post = pre.clone();
        post.reviewer = Some(actor.to_string());

        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::ReviewClaimed, actor, serde_json::json!({}))?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `review-submit` (spec §4.H.7): the claiming reviewer records a
    /// verdict. `Reject` loops back to `in_progress` unless the max cycle
    /// count is reached, in which case it forces `escalated`.
    pub fn review_submit(
        &self,
        packet_id: &str,
        actor: &str,
        verdict: ReviewVerdict,
        assessment: ReviewAssessment,
    ) -> GovernanceResult<DclCommit> {
        assessment.validate().map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if pre.status != PacketStatus::Review {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "review",
                actual: pre.status,
            }
            .into());
        }
        if pre.reviewer.as_deref() != Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("only the claiming reviewer may submit a verdict".to_string()).into());
        }

        let mut post = pre.clone();
        post.review = Some(assessment.clone());

        let event = match verdict {
            ReviewVerdict::Approve => {
                post.status = PacketStatus::Done;
                post.completed_at = Some(Utc::now());
                LifecycleEvent::ReviewSubmitted
            }
            ReviewVerdict::Reject => {
                post.cycle_count += 1;
                if post.cycle_count >= self.config.max_review_cycles {
                    post.status = PacketStatus::Escalated;
                    LifecycleEvent::Escalated
                } else {
                    post.status = PacketStatus::InProgress;
                    post.reviewer = None;
                    LifecycleEvent::ReviewSubmitted
                }
            }
            ReviewVerdict::Escalate => {
                post.status = PacketStatus::Escalated;
                LifecycleEvent::Escalated
            }
        };

        let inputs = serde_json::json!({ "verdict": verdict, "assessment": assessment });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post.clone(), event, actor, inputs)?;
        if post.status == PacketStatus::Done {
            self.maybe_register_residual_risk(packet_id, actor, &post)?;
        }
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `fail` (spec §4.H.8): halt a packet for cause. Legal only from
    /// `in_progress`, `preflight`, `review`, or `stalled`; triggers
    /// blocked-propagation to dependents.
    pub fn fail(&self, packet_id: &str, actor: &str, actor_is_supervisor: bool, reason: String) -> GovernanceResult<DclCommit> {
        govctl_types::validate_narrative("reason", &reason).map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if !matches!(
            pre.status,
            PacketStatus::InProgress | PacketStatus::Preflight | PacketStatus::Review | PacketStatus::Stalled
        ) {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "in_progress, preflight, review, or stalled",
                actual: pre.status,
            }
            .into());
        }
        if !actor_is_supervisor && pre.assigned_to.as_deref() != Some(actor) {
            return Err(InvalidTransitionReason::IdentityConflict("fail requires the assigned executor or a supervisor".to_string()).into());
        }

        let mut post = pre.clone();
        post.status = PacketStatus::Failed;
        post.completed_at = Some(Utc::now());
        post.notes.push(reason.clone());

        let inputs = serde_json::json!({ "reason": reason });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::Failed, actor, inputs)?;
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `reset` (spec §4.H.9): supervisor-only return of a terminal-except-
    /// reset packet back to `pending`, clearing ownership and history
    /// fields (but not the append-only `notes` narrative).
    pub fn reset(&self, packet_id: &str, actor: &str, actor_is_supervisor: bool, reason: String) -> GovernanceResult<DclCommit> {
        govctl_types::validate_narrative("reason", &reason).map_err(GovernanceError::SchemaInvalid)?;
        if !actor_is_supervisor {
            return Err(InvalidTransitionReason::IdentityConflict("reset requires supervisor role".to_string()).into());
        }

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        if !pre.status.is_reset_eligible() {
            return Err(InvalidTransitionReason::WrongStatus {
                expected: "failed, stalled, escalated, or preflight",
                actual: pre.status,
            }
            .into());
        }

        let mut post = pre.clone();
        post.status = PacketStatus::Pending;
        post.assigned_to = None;
        post.reviewer = None;
        post.preflight = None;
        post.review = None;
        post.heartbeat_payload = None;
        post.last_heartbeat_at = None;
        post.started_at = None;
        post.completed_at = None;
        post.cycle_count = 0;
        post.notes.push(format!("reset: {reason}"));

        let inputs = serde_json::json!({ "reason": reason });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::Reset, actor, inputs)?;
        self.propagate(&mut doc)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `note` (spec §4.H.10): append a free-form narrative entry without
    /// changing status. Allowed at any point in a packet's lifecycle.
    pub fn note(&self, packet_id: &str, actor: &str, text: String) -> GovernanceResult<DclCommit> {
        govctl_types::validate_narrative("text", &text).map_err(GovernanceError::SchemaInvalid)?;

        let _lock = self.state_store.lock()?;
        let mut doc = self.state_store.load()?;
        let pre = Self::pre_state(&doc, packet_id);

        let mut post = pre.clone();
        post.notes.push(text.clone());

        let inputs = serde_json::json!({ "text": text });
        let commit = self.commit_transition(&mut doc, packet_id, &pre, post, LifecycleEvent::Noted, actor, inputs)?;
        self.state_store.save(&doc)?;
        Ok(commit)
    }

    /// `closeout-l2` (spec §4.H.11): area-wide checkpoint. Requires every
    /// packet in the area to be `done`; emits a [`ProjectCheckpoint`] over
    /// every packet's current HEAD rather than a single-packet commit.
    pub fn closeout_l2(&self, area_id: &str, actor: &str) -> GovernanceResult<ProjectCheckpoint> {
        let area = self
            .definitions
            .area(area_id)
            .ok_or_else(|| GovernanceError::NotFound(format!("area '{area_id}'")))?;

        let _lock = self.state_store.lock()?;
        let doc = self.state_store.load()?;

        let incomplete: Vec<String> = area
            .packets
            .iter()
            .filter(|p| doc.packets.get(*p).map(|s| s.status) != Some(PacketStatus::Done))
            .cloned()
            .collect();
        if !incomplete.is_empty() {
            return Err(InvalidTransitionReason::DependencyUnmet(incomplete).into());
        }

        let mut head_table = std::collections::BTreeMap::new();
        for packet_id in self.definitions.packets().map(|p| p.id.clone()) {
            if let Some(head) = self.commit_store.read_head(&packet_id)? {
                head_table.insert(packet_id, head);
            }
        }
        let checkpoint_hash = govctl_canon::hash_value(&head_table)?;
        let checkpoint = ProjectCheckpoint {
            checkpoint_id: uuid::Uuid::new_v4(),
            created_at: Utc::now(),
            head_table,
            checkpoint_hash,
        };
        self.checkpoint_store.write(&checkpoint)?;

        self.lifecycle_log.append(&LifecycleLogEntry {
            timestamp: checkpoint.created_at,
            packet_id: None,
            event: LifecycleEvent::CloseoutL2,
            actor: actor.to_string(),
            details: serde_json::json!({ "area_id": area_id, "checkpoint_id": checkpoint.checkpoint_id }),
        })?;

        tracing::info!(area_id, checkpoint_id = %checkpoint.checkpoint_id, packets = checkpoint.head_table.len(), "area closeout checkpoint written");
        Ok(checkpoint)
    }
}
