use govctl_cli::cli::Command;
use govctl_cli::commands::dispatch;
use govctl_config::GovernanceConfig;

fn definition_json() -> serde_json::Value {
    serde_json::json!({
        "work_areas": [
            {"id": "a1", "title": "Area One", "description": "", "packets": ["p1"]}
        ],
        "packets": [
            {
                "id": "p1",
                "wbs_ref": "1.1",
                "area_id": "a1",
                "title": "Packet One",
                "scope": "",
                "preconditions": [],
                "required_actions": [],
                "required_outputs": [],
                "validation_checks": [],
                "exit_criteria": [],
                "halt_conditions": [],
                "dependencies": [],
                "preflight_required": false,
                "review_required": false,
                "heartbeat_required": false,
                "heartbeat_interval_seconds": null,
                "context_manifest": [],
                "template_ref": null,
                "ontology_required": false
            }
        ]
    })
}

fn init_root(root: &std::path::Path) -> GovernanceConfig {
    let definition_path = root.join("incoming-definition.json");
    std::fs::write(&definition_path, serde_json::to_vec(&definition_json()).unwrap()).unwrap();

    let mut config = GovernanceConfig::default();
    config.root = root.to_path_buf();

    let (report, exit) = dispatch(&Command::Init { definition_path }, &config);
    assert_eq!(exit, 0, "init failed: {:?}", report);
    assert!(report.ok);
    config
}

#[test]
fn init_then_ready_lists_the_one_packet() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(&Command::Ready, &config);
    assert_eq!(exit, 0);
    assert_eq!(report.data.unwrap(), serde_json::json!(["p1"]));
}

#[test]
fn claim_then_done_reaches_terminal_status_without_gates() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(
        &Command::Claim {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );
    assert_eq!(exit, 0, "claim failed: {:?}", report);
    let state = report.state_snapshot.expect("claim should carry a state snapshot");
    assert_eq!(state.status, govctl_types::PacketStatus::InProgress);

    let (report, exit) = dispatch(
        &Command::Done {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            evidence: "implemented and manually verified".to_string(),
            risk_ack: None,
        },
        &config,
    );
    assert_eq!(exit, 0, "done failed: {:?}", report);
    let state = report.state_snapshot.expect("done should carry a state snapshot");
    assert_eq!(state.status, govctl_types::PacketStatus::Done);
}

#[test]
fn claim_by_wrong_actor_done_is_rejected_with_governance_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    dispatch(
        &Command::Claim {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );

    let (report, exit) = dispatch(
        &Command::Done {
            packet_id: "p1".to_string(),
            actor: "mallory".to_string(),
            evidence: "not actually alice".to_string(),
            risk_ack: None,
        },
        &config,
    );
    assert!(!report.ok);
    assert_eq!(exit, 3);
}

#[test]
fn claim_unknown_packet_is_not_found_with_exit_three() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(
        &Command::Claim {
            packet_id: "does-not-exist".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );
    assert!(!report.ok);
    assert_eq!(report.code, "not_found");
    assert_eq!(exit, 3);
}

#[test]
fn status_without_packet_id_dumps_every_packet_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());
    dispatch(
        &Command::Claim {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );

    let (report, exit) = dispatch(&Command::Status { packet_id: None }, &config);
    assert_eq!(exit, 0);
    let data = report.data.unwrap();
    assert_eq!(data["packets"]["p1"]["status"], "in_progress");
    assert!(data.get("config").is_some());
}

#[test]
fn verify_all_passes_after_a_clean_claim() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());
    dispatch(
        &Command::Claim {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );

    let (report, exit) = dispatch(&Command::Verify { packet_id: None, all: true }, &config);
    assert_eq!(exit, 0, "verify failed: {:?}", report);
    assert!(report.ok);
}

#[test]
fn verify_without_packet_id_or_all_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(&Command::Verify { packet_id: None, all: false }, &config);
    assert_eq!(exit, 2);
    assert_eq!(report.code, "usage");
}

#[test]
fn heartbeat_with_malformed_json_payload_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());
    dispatch(
        &Command::Claim {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            context_attestation: vec![],
        },
        &config,
    );

    let (report, exit) = dispatch(
        &Command::Heartbeat {
            packet_id: "p1".to_string(),
            actor: "alice".to_string(),
            payload: "not json".to_string(),
        },
        &config,
    );
    assert_eq!(exit, 2);
    assert_eq!(report.code, "usage");
}

#[test]
fn closeout_l2_requires_an_existing_assessment_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(
        &Command::CloseoutL2 {
            area_id: "a1".to_string(),
            supervisor: "bob".to_string(),
            assessment_path: dir.path().join("missing-assessment.txt"),
            notes: None,
        },
        &config,
    );
    assert_eq!(exit, 2);
    assert_eq!(report.code, "usage");
}

#[test]
fn doctor_fast_reports_healthy_after_init() {
    let dir = tempfile::tempdir().unwrap();
    let config = init_root(dir.path());

    let (report, exit) = dispatch(&Command::Doctor { full: false }, &config);
    assert_eq!(exit, 0, "doctor failed: {:?}", report);
    assert!(report.ok);
}
