use govctl_types::{validate_actor, validate_narrative, MAX_ACTOR_ID_LEN, MAX_NARRATIVE_LEN};
use govctl_types::{HeartbeatPayload, PreflightAssessment, ReviewAssessment};

#[test]
fn test_validate_narrative() {
    assert!(validate_narrative("evidence", "shipped the thing").is_ok());
    assert!(validate_narrative("evidence", "").is_err());
    assert!(validate_narrative("evidence", "   ").is_err());

    let long = "x".repeat(MAX_NARRATIVE_LEN + 1);
    assert!(validate_narrative("evidence", &long).is_err());

    let boundary = "x".repeat(MAX_NARRATIVE_LEN);
    assert!(validate_narrative("evidence", &boundary).is_ok());
}

#[test]
fn test_validate_actor() {
    assert!(validate_actor("alice").is_ok());
    assert!(validate_actor("").is_err());
    assert!(validate_actor(&"x".repeat(MAX_ACTOR_ID_LEN + 1)).is_err());
    assert!(validate_actor(&"x".repeat(MAX_ACTOR_ID_LEN)).is_ok());
}

#[test]
fn test_preflight_assessment_requires_all_keys() {
    let full = PreflightAssessment {
        context_confirmation: "read all files".to_string(),
        ambiguity_register: "none".to_string(),
        risk_flags: "none".to_string(),
        execution_plan: "implement then test".to_string(),
    };
    assert!(full.validate().is_ok());

    let missing_plan = PreflightAssessment {
        execution_plan: String::new(),
        ..full.clone()
    };
    assert!(missing_plan.validate().is_err());
}

#[test]
fn test_review_assessment_requires_all_keys() {
    let full = ReviewAssessment {
        exit_criteria_assessment: "met".to_string(),
        findings: "clean".to_string(),
        risk_flags: "none".to_string(),
    };
    assert!(full.validate().is_ok());

    let missing_findings = ReviewAssessment {
        findings: "   ".to_string(),
        ..full.clone()
    };
    assert!(missing_findings.validate().is_err());
}

#[test]
fn test_heartbeat_payload_requires_all_keys() {
    let full = HeartbeatPayload {
        status: "on track".to_string(),
        decisions: "chose approach A".to_string(),
        obstacles: "none".to_string(),
        completion_estimate: "2h".to_string(),
    };
    assert!(full.validate().is_ok());

    let missing_obstacles = HeartbeatPayload {
        obstacles: String::new(),
        ..full.clone()
    };
    assert!(missing_obstacles.validate().is_err());
}
