//! Command dispatch: turns a parsed [`crate::cli::Command`] into calls
//! against [`govctl_kernel::Engine`] / [`govctl_verify::Verifier`] /
//! [`govctl_verify::Doctor`], and packages the outcome as a
//! [`crate::report::GovernanceReport`] plus the process exit code it maps
//! to (spec §6, §7).
//!
//! Grounded on `toka-config-cli::main`'s single dispatch function returning
//! a result the caller turns into a process exit, generalized here from one
//! binary action into a `match` over the full operator command table.

use std::fs;
use std::path::Path;

use govctl_config::GovernanceConfig;
use govctl_kernel::{Engine, EngineConfig, GovernanceError, GovernanceResult};
use govctl_store::{DclConfig, DclConfigStore, LifecycleLog};
use govctl_types::{HeartbeatPayload, PreflightAssessment, ResidualRiskAck, ReviewAssessment, ReviewVerdict};
use govctl_verify::{Doctor, DoctorMode, Verifier};

use crate::cli::Command;
use crate::report::GovernanceReport;

/// Run `command` against the governance root described by `config`.
/// Returns the report to print and the process exit code.
pub fn dispatch(command: &Command, config: &GovernanceConfig) -> (GovernanceReport, i32) {
    match command {
        Command::Init { definition_path } => wrap(cmd_init(definition_path, &config.root)),
        Command::Ready => engine_op(config, |engine| {
            let ready = engine.ready()?;
            Ok(GovernanceReport::ok_with_data(format!("{} packet(s) ready", ready.len()), serde_json::json!(ready)))
        }),
        Command::Status { packet_id } => engine_op(config, |engine| match packet_id {
            Some(id) => {
                let state = engine.status(id)?;
                match state {
                    Some(state) => Ok(GovernanceReport::ok_with_state(format!("status for '{id}'"), Some(state))),
                    None => Err(GovernanceError::NotFound(format!("packet '{id}'"))),
                }
            }
            None => {
                let all = engine.all_status()?;
                let data = serde_json::json!({
                    "packets": all,
                    "config": config,
                });
                Ok(GovernanceReport::ok_with_data(format!("{} packet(s) known", all.len()), data))
            }
        }),
        Command::Claim {
            packet_id,
            actor,
            context_attestation,
        } => engine_op(config, |engine| {
            let commit = engine.claim(packet_id, actor, context_attestation.clone())?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("claimed '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::Preflight { packet_id, actor, assessment } => engine_op(config, |engine| {
            let assessment: PreflightAssessment = parse_json(assessment, "assessment")?;
            let commit = engine.preflight(packet_id, actor, assessment)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("preflight recorded for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::PreflightApprove { packet_id, actor } => engine_op(config, |engine| {
            let commit = engine.preflight_approve(packet_id, actor)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("preflight approved for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::PreflightReturn { packet_id, actor, reason } => engine_op(config, |engine| {
            let commit = engine.preflight_return(packet_id, actor, reason.clone())?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("preflight returned for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::Heartbeat { packet_id, actor, payload } => engine_op(config, |engine| {
            let payload: HeartbeatPayload = parse_json(payload, "payload")?;
            let commit = engine.heartbeat(packet_id, actor, payload)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("heartbeat recorded for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::CheckStalled => engine_op(config, |engine| {
            let mut newly_stalled = Vec::new();
            for packet_id in engine.definitions().packets().map(|p| p.id.clone()).collect::<Vec<_>>() {
                if let Some(commit) = engine.check_stalled(&packet_id)? {
                    newly_stalled.push(commit_summary(&commit));
                }
            }
            Ok(GovernanceReport::ok_with_data(
                format!("{} packet(s) transitioned", newly_stalled.len()),
                serde_json::json!(newly_stalled),
            ))
        }),
        Command::Done {
            packet_id,
            actor,
            evidence,
            risk_ack,
        } => engine_op(config, |engine| {
            let risk_ack = match risk_ack {
                Some(raw) => parse_json(raw, "risk_ack")?,
                None => ResidualRiskAck::None,
            };
            let commit = engine.done(packet_id, actor, evidence.clone(), risk_ack)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("'{packet_id}' marked done"), state).with_data(commit_summary(&commit)))
        }),
        Command::ReviewClaim { packet_id, actor } => engine_op(config, |engine| {
            let commit = engine.review_claim(packet_id, actor)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("review claimed for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::ReviewSubmit {
            packet_id,
            actor,
            verdict,
            assessment,
        } => engine_op(config, |engine| {
            let verdict = parse_verdict(verdict)?;
            let assessment: ReviewAssessment = parse_json(assessment, "assessment")?;
            let commit = engine.review_submit(packet_id, actor, verdict, assessment)?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("review verdict recorded for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::Fail { packet_id, actor, reason, supervisor } => engine_op(config, |engine| {
            let commit = engine.fail(packet_id, actor, *supervisor, reason.clone())?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("'{packet_id}' failed"), state).with_data(commit_summary(&commit)))
        }),
        Command::Reset { packet_id, supervisor, reason } => engine_op(config, |engine| {
            let commit = engine.reset(packet_id, supervisor, true, reason.clone())?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("'{packet_id}' reset"), state).with_data(commit_summary(&commit)))
        }),
        Command::Note { packet_id, actor, text } => engine_op(config, |engine| {
            let commit = engine.note(packet_id, actor, text.clone())?;
            let state = engine.status(packet_id)?;
            Ok(GovernanceReport::ok_with_state(format!("note recorded for '{packet_id}'"), state).with_data(commit_summary(&commit)))
        }),
        Command::CloseoutL2 {
            area_id,
            supervisor,
            assessment_path,
            notes,
        } => engine_op(config, |engine| {
            if !assessment_path.exists() {
                return Err(GovernanceError::Usage(format!(
                    "assessment path '{}' does not exist",
                    assessment_path.display()
                )));
            }
            let checkpoint = engine.closeout_l2(area_id, supervisor)?;
            let data = serde_json::json!({
                "checkpoint_id": checkpoint.checkpoint_id,
                "checkpoint_hash": checkpoint.checkpoint_hash,
                "packets_closed": checkpoint.head_table.len(),
                "assessment_path": assessment_path,
                "notes": notes,
            });
            Ok(GovernanceReport::ok_with_data(format!("area '{area_id}' closed out"), data))
        }),
        Command::Verify { packet_id, all } => {
            if packet_id.is_none() && !*all {
                return (GovernanceReport::err("usage", "verify requires a packet_id or --all"), 2);
            }
            verify_op(config, |verifier| match (packet_id, all) {
                (Some(id), _) => {
                    let result = verifier.verify_packet(id)?;
                    let ok = result.ok;
                    Ok((ok, GovernanceReport::ok_with_data(format!("verified '{id}'"), serde_json::to_value(result)?)))
                }
                (None, _) => {
                    let result = verifier.verify_all()?;
                    let ok = result.ok;
                    Ok((ok, GovernanceReport::ok_with_data("verified every known packet".to_string(), serde_json::to_value(result)?)))
                }
            })
        }
        Command::History { packet_id } => verify_op(config, |verifier| {
            let history = verifier.history(packet_id)?;
            Ok((true, GovernanceReport::ok_with_data(format!("{} commit(s)", history.len()), serde_json::to_value(history)?)))
        }),
        Command::ExportProof { packet_id, out } => verify_op(config, |verifier| {
            let manifest = verifier.export_proof(packet_id)?;
            match out {
                Some(path) => {
                    let bytes = govctl_canon::canonical_bytes(&manifest)?;
                    fs::write(path, &bytes)
                        .map_err(|e| govctl_verify::VerifyRunError::Store(govctl_store::StoreError::from(e)))?;
                    Ok((
                        true,
                        GovernanceReport::ok(format!("proof for '{packet_id}' written to '{}'", path.display())),
                    ))
                }
                None => Ok((
                    true,
                    GovernanceReport::ok_with_data(format!("proof for '{packet_id}'"), serde_json::to_value(manifest)?),
                )),
            }
        }),
        Command::Doctor { full } => {
            let doctor = Doctor::open(&config.root);
            let mode = if *full { DoctorMode::Full } else { DoctorMode::Fast };
            match doctor.run(mode) {
                Ok(report) => {
                    let ok = report.ok;
                    let data = match serde_json::to_value(&report) {
                        Ok(v) => v,
                        Err(e) => return (GovernanceReport::err("schema_invalid", e.to_string()), 2),
                    };
                    let message = format!("doctor ({}) {}", report.mode, if ok { "healthy" } else { "found issues" });
                    let exit = if ok { 0 } else { 5 };
                    (GovernanceReport::ok_with_data(message, data), exit)
                }
                Err(e) => (GovernanceReport::err("io_error", e.to_string()), 5),
            }
        }
        Command::Log { n } => {
            let log = LifecycleLog::new(&config.root);
            match log.tail(n.unwrap_or(20)) {
                Ok(entries) => (
                    GovernanceReport::ok_with_data(format!("{} log entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" }), serde_json::json!(entries)),
                    0,
                ),
                Err(e) => (GovernanceReport::err("io_error", e.to_string()), 5),
            }
        }
    }
}

fn cmd_init(definition_path: &Path, root: &Path) -> GovernanceResult<GovernanceReport> {
    let bytes = fs::read(definition_path).map_err(|e| GovernanceError::Usage(format!("cannot read '{}': {e}", definition_path.display())))?;
    let doc: govctl_defs::DefinitionDocument =
        serde_json::from_slice(&bytes).map_err(|e| GovernanceError::SchemaInvalid(format!("definition document is not valid JSON: {e}")))?;
    let definitions = govctl_defs::Definitions::from_document(doc)?;

    fs::create_dir_all(root)?;
    govctl_store::atomic_write(&root.join("definition.json"), &bytes)?;

    let constitution_path = root.join("constitution.txt");
    if !constitution_path.exists() {
        fs::write(&constitution_path, b"")?;
    }

    DclConfigStore::new(root).write(&DclConfig::current())?;

    let data = serde_json::json!({
        "areas": definitions.areas().count(),
        "packets": definitions.packets().count(),
        "root": root,
    });
    Ok(GovernanceReport::ok_with_data(format!("initialized governance root at '{}'", root.display()), data))
}

fn engine_op<F>(config: &GovernanceConfig, f: F) -> (GovernanceReport, i32)
where
    F: FnOnce(&Engine) -> GovernanceResult<GovernanceReport>,
{
    wrap(open_engine(config).and_then(|engine| f(&engine)))
}

fn open_engine(config: &GovernanceConfig) -> GovernanceResult<Engine> {
    Engine::open(&config.root, effective_engine_config(config))
}

fn effective_engine_config(config: &GovernanceConfig) -> EngineConfig {
    config.engine_config()
}

fn wrap(result: GovernanceResult<GovernanceReport>) -> (GovernanceReport, i32) {
    match result {
        Ok(report) => (report, 0),
        Err(e) => {
            let exit = e.exit_code();
            (GovernanceReport::err(e.code(), e.to_string()), exit)
        }
    }
}

/// Dispatch helper for `Verifier`-backed commands. The closure returns
/// whether the check itself passed alongside the report to print; a
/// passing check exits 0, a failing one exits 5, and a plumbing error
/// (I/O, definitions, canonicalization) also exits 5.
fn verify_op<F>(config: &GovernanceConfig, f: F) -> (GovernanceReport, i32)
where
    F: FnOnce(&Verifier) -> Result<(bool, GovernanceReport), govctl_verify::VerifyRunError>,
{
    match Verifier::open(&config.root) {
        Ok(verifier) => match f(&verifier) {
            Ok((true, report)) => (report, 0),
            Ok((false, report)) => (report, 5),
            Err(e) => (GovernanceReport::err("integrity_failure", e.to_string()), 5),
        },
        Err(e) => (GovernanceReport::err("integrity_failure", e.to_string()), 5),
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, field: &str) -> GovernanceResult<T> {
    serde_json::from_str(raw).map_err(|e| GovernanceError::Usage(format!("invalid --{field} JSON: {e}")))
}

fn parse_verdict(raw: &str) -> GovernanceResult<ReviewVerdict> {
    match raw.to_ascii_uppercase().as_str() {
        "APPROVE" => Ok(ReviewVerdict::Approve),
        "REJECT" => Ok(ReviewVerdict::Reject),
        "ESCALATE" => Ok(ReviewVerdict::Escalate),
        other => Err(GovernanceError::Usage(format!("unknown verdict '{other}', expected approve, reject, or escalate"))),
    }
}

fn commit_summary(commit: &govctl_types::DclCommit) -> serde_json::Value {
    serde_json::json!({
        "commit_id": commit.commit_id,
        "seq": commit.seq,
        "commit_hash": commit.commit_hash,
        "event": commit.action_envelope.event,
    })
}
