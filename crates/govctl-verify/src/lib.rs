#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-verify** – the Verifier (spec §4.I) and Integrity Runtime
//! (spec §4.J, "doctor") for govctl.
//!
//! This crate never decides whether a transition *was* legal — that already
//! happened in `govctl-kernel` when the commit was written. It only answers
//! "does what's on disk still agree with itself": chain linkage, HEAD,
//! and the binding between `state.json` and each packet's HEAD.

mod doctor;
mod error;
mod report;
mod verifier;

pub use doctor::{Doctor, DoctorMode, Posture};
pub use error::{VerifyError, VerifyResult, VerifyRunError};
pub use report::{DoctorFailure, DoctorReport, PacketVerification, ProofManifest, VerifyAllReport};
pub use verifier::Verifier;

#[cfg(test)]
mod tests {
    use super::*;
    use govctl_defs::DefinitionDocument;
    use govctl_store::{CommitStore, DclConfig, DclConfigStore, StateStore};
    use govctl_types::{
        ActionEnvelope, ContextManifestEntry, DclCommit, LifecycleEvent, PacketDefinition, PacketRuntimeState,
        PacketStatus, WorkArea,
    };
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn write_definition(dir: &TempDir) {
        let doc = DefinitionDocument {
            work_areas: vec![WorkArea {
                id: "a1".to_string(),
                title: "a1".to_string(),
                description: String::new(),
                packets: vec!["p1".to_string()],
            }],
            packets: vec![PacketDefinition {
                id: "p1".to_string(),
                wbs_ref: "1.1".to_string(),
                area_id: "a1".to_string(),
                title: "p1".to_string(),
                scope: String::new(),
                preconditions: vec![],
                required_actions: vec![],
                required_outputs: vec![],
                validation_checks: vec![],
                exit_criteria: vec![],
                halt_conditions: vec![],
                dependencies: vec![],
                preflight_required: false,
                review_required: false,
                heartbeat_required: false,
                heartbeat_interval_seconds: None,
                context_manifest: vec![ContextManifestEntry {
                    file: "README.md".to_string(),
                    priority: 0,
                    required: true,
                }],
                template_ref: None,
                ontology_required: false,
            }],
        };
        fs::write(dir.path().join("definition.json"), serde_json::to_vec(&doc).unwrap()).unwrap();
    }

    /// Claim-then-done, writing exactly two commits for `p1` plus a matching
    /// `state.json`, the way `govctl-kernel::Engine` would.
    fn seed_two_commits(dir: &TempDir) {
        let commit_store = CommitStore::new(dir.path());
        let state_store = StateStore::new(dir.path());
        let mut doc = state_store.load().unwrap();

        let pre = PacketRuntimeState::pending();
        let mut post = pre.clone();
        post.status = PacketStatus::InProgress;
        post.assigned_to = Some("alice".to_string());
        let pre_hash = govctl_canon::hash_value(&pre).unwrap();
        let post_hash = govctl_canon::hash_value(&post).unwrap();
        commit_store
            .append_commit("p1", |seq, prev| {
                let mut c = DclCommit {
                    commit_id: uuid::Uuid::new_v4(),
                    packet_id: "p1".to_string(),
                    seq,
                    prev_commit_hash: prev,
                    action_hash: "a".repeat(64),
                    pre_state_hash: pre_hash.clone(),
                    post_state_hash: post_hash.clone(),
                    constitution_hash: "c".repeat(64),
                    diff: serde_json::json!({}),
                    created_at: chrono::Utc::now(),
                    action_envelope: ActionEnvelope {
                        event: LifecycleEvent::Claimed,
                        actor: "alice".to_string(),
                        inputs: serde_json::json!({}),
                        timestamp: chrono::Utc::now(),
                    },
                    commit_hash: String::new(),
                };
                c.commit_hash = govctl_store::compute_commit_hash(&c)?;
                Ok(c)
            })
            .unwrap();
        doc.packets.insert("p1".to_string(), post.clone());
        state_store.save(&doc).unwrap();

        let pre2 = post;
        let mut post2 = pre2.clone();
        post2.status = PacketStatus::Done;
        let pre2_hash = govctl_canon::hash_value(&pre2).unwrap();
        let post2_hash = govctl_canon::hash_value(&post2).unwrap();
        commit_store
            .append_commit("p1", |seq, prev| {
                let mut c = DclCommit {
                    commit_id: uuid::Uuid::new_v4(),
                    packet_id: "p1".to_string(),
                    seq,
                    prev_commit_hash: prev,
                    action_hash: "a".repeat(64),
                    pre_state_hash: pre2_hash.clone(),
                    post_state_hash: post2_hash.clone(),
                    constitution_hash: "c".repeat(64),
                    diff: serde_json::json!({}),
                    created_at: chrono::Utc::now(),
                    action_envelope: ActionEnvelope {
                        event: LifecycleEvent::Completed,
                        actor: "alice".to_string(),
                        inputs: serde_json::json!({}),
                        timestamp: chrono::Utc::now(),
                    },
                    commit_hash: String::new(),
                };
                c.commit_hash = govctl_store::compute_commit_hash(&c)?;
                Ok(c)
            })
            .unwrap();
        doc.packets.insert("p1".to_string(), post2);
        state_store.save(&doc).unwrap();
    }

    #[test]
    fn test_verify_packet_ok_on_well_formed_chain() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let verifier = Verifier::open(dir.path()).unwrap();
        let result = verifier.verify_packet("p1").unwrap();
        assert!(result.ok, "unexpected failures: {:?}", result.failures);
        assert_eq!(result.commit_count, 2);
    }

    #[test]
    fn test_verify_packet_detects_tampered_state() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let state_store = StateStore::new(dir.path());
        let mut doc = state_store.load().unwrap();
        doc.packets.get_mut("p1").unwrap().assigned_to = Some("mallory".to_string());
        state_store.save(&doc).unwrap();

        let verifier = Verifier::open(dir.path()).unwrap();
        let result = verifier.verify_packet("p1").unwrap();
        assert!(!result.ok);
        assert!(result
            .failures
            .iter()
            .any(|f| matches!(f, VerifyError::ErrRuntimeBindingMismatch { .. })));
    }

    #[test]
    fn test_verify_packet_detects_broken_prev_hash() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let commits_dir = dir.path().join("dcl/packets/p1/commits");
        let path = commits_dir.join("000002.json");
        let mut commit: DclCommit = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        commit.prev_commit_hash = "f".repeat(64);
        commit.commit_hash = govctl_store::compute_commit_hash(&commit).unwrap();
        fs::write(&path, serde_json::to_vec(&commit).unwrap()).unwrap();

        let verifier = Verifier::open(dir.path()).unwrap();
        let result = verifier.verify_packet("p1").unwrap();
        assert!(!result.ok);
        assert!(result
            .failures
            .iter()
            .any(|f| matches!(f, VerifyError::ErrPrevHashMismatch { .. })));
    }

    #[test]
    fn test_verify_all_reports_every_known_packet() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let verifier = Verifier::open(dir.path()).unwrap();
        let report = verifier.verify_all().unwrap();
        assert!(report.ok);
        assert_eq!(report.packets.len(), 1);
    }

    #[test]
    fn test_history_returns_ordered_chain() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let verifier = Verifier::open(dir.path()).unwrap();
        let history = verifier.history("p1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].seq, 1);
        assert_eq!(history[1].seq, 2);
    }

    #[test]
    fn test_export_proof_hash_is_reproducible() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);
        fs::write(dir.path().join("constitution.txt"), b"governance rules v1").unwrap();

        let verifier = Verifier::open(dir.path()).unwrap();
        let proof = verifier.export_proof("p1").unwrap();
        assert_eq!(proof.commits.len(), 2);
        assert_eq!(proof.constitution_snapshot, "governance rules v1");

        let mut blanked = proof.clone();
        blanked.manifest_hash = String::new();
        assert_eq!(govctl_canon::hash_value(&blanked).unwrap(), proof.manifest_hash);
    }

    #[test]
    fn test_checkpoint_snapshots_current_heads() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let verifier = Verifier::open(dir.path()).unwrap();
        let checkpoint = verifier.checkpoint().unwrap();
        assert_eq!(checkpoint.head_table.len(), 1);
        assert!(checkpoint.head_table.contains_key("p1"));
    }

    #[test]
    fn test_doctor_fast_mode_reports_healthy_root() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);
        DclConfigStore::new(dir.path()).write(&DclConfig::current()).unwrap();

        let doctor = Doctor::open(dir.path());
        let report = doctor.run(DoctorMode::Fast).unwrap();
        assert!(report.ok, "unexpected failures: {:?}", report.failures);
        assert_eq!(report.packet_count, 1);
        assert_eq!(report.commit_count, 2);
    }

    #[test]
    fn test_doctor_flags_missing_dcl_config() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);

        let doctor = Doctor::open(dir.path());
        let report = doctor.run(DoctorMode::Fast).unwrap();
        assert!(!report.ok);
        assert!(report.failures.iter().any(|f| f.detail.contains("dcl-config.json is missing")));
    }

    #[test]
    fn test_doctor_full_mode_matches_fast_mode_on_healthy_root() {
        let dir = tempdir().unwrap();
        write_definition(&dir);
        seed_two_commits(&dir);
        DclConfigStore::new(dir.path()).write(&DclConfig::current()).unwrap();

        let doctor = Doctor::open(dir.path());
        let fast = doctor.run(DoctorMode::Fast).unwrap();
        let full = doctor.run(DoctorMode::Full).unwrap();
        assert_eq!(fast.ok, full.ok);
    }
}
