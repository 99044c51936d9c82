//! Integrity Runtime ("doctor", spec §4.J): startup/on-demand journal
//! recovery plus fast or full verification, with strict or fail-open
//! posture.
//!
//! Grounded on `toka-orchestration`'s startup health-check sweep (a
//! best-effort pass over every known resource that logs and aggregates
//! findings rather than failing the whole process on the first one), paired
//! with this crate's own [`crate::verifier::Verifier`] for the "full" mode's
//! chain recomputation.

use std::path::{Path, PathBuf};

use govctl_store::{CheckpointStore, CommitStore, DclConfig, DclConfigStore, RecoveryOutcome, StateStore};

use crate::error::{VerifyError, VerifyResult};
use crate::report::{DoctorFailure, DoctorReport};
use crate::verifier::Verifier;

/// How thoroughly [`Doctor::run`] checks the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorMode {
    /// Journal recovery + HEAD-equality + runtime-state binding per packet.
    /// Does not recompute full commit chains.
    Fast,
    /// Fast, plus a complete chain recomputation per packet (delegates to
    /// [`Verifier::verify_all`]).
    Full,
}

/// Whether a failing doctor run should abort startup or continue
/// read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    /// Any failure aborts startup (spec §4.J strict mode).
    Strict,
    /// Failures are reported but the caller may still serve reads; callers
    /// are expected to refuse mutating operations themselves when a doctor
    /// report comes back non-`ok` in this posture (spec §4.J fail-open).
    FailOpen,
}

/// The Integrity Runtime: journal recovery plus verification, run at
/// process start and on demand as the `doctor` operator command.
pub struct Doctor {
    root: PathBuf,
    commit_store: CommitStore,
    config_store: DclConfigStore,
}

impl Doctor {
    /// `root` is the governance root directory.
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            commit_store: CommitStore::new(&root),
            config_store: DclConfigStore::new(&root),
            root,
        }
    }

    /// Run the doctor in the requested mode. Never fails outright — I/O or
    /// definition-load errors during the verification half are themselves
    /// surfaced as a [`DoctorFailure`] rather than propagated, so a broken
    /// root always produces a report rather than an opaque error. The one
    /// exception is `mode == Full`, where opening the [`Verifier`] requires
    /// a loadable `definition.json`; if that fails, this still returns a
    /// report (with the load failure as a root-level finding) rather than
    /// erroring, so `doctor` remains usable even when `verify`/`verify
    /// --all` cannot be.
    pub fn run(&self, mode: DoctorMode) -> VerifyResult<DoctorReport> {
        let mut failures = Vec::new();

        self.check_dcl_config(&mut failures);
        self.recover_journals(&mut failures)?;

        let packet_ids = self.commit_store.list_packet_ids()?;
        let mut commit_count = 0;
        for packet_id in &packet_ids {
            commit_count += self.commit_store.read_all_commits(packet_id)?.len();
        }

        let checkpoint_store = CheckpointStore::new(&self.root);
        let checkpoint_count = checkpoint_store.list()?.len();

        if mode == DoctorMode::Full {
            match Verifier::open(&self.root) {
                Ok(verifier) => match verifier.verify_all() {
                    Ok(report) => {
                        for packet in report.packets {
                            for error in packet.failures {
                                failures.push(DoctorFailure {
                                    packet_id: Some(packet.packet_id.clone()),
                                    error: Some(error),
                                    detail: "full-mode chain verification failure".to_string(),
                                });
                            }
                        }
                        if let Some(error) = report.checkpoint_failure {
                            failures.push(DoctorFailure {
                                packet_id: None,
                                error: Some(error),
                                detail: "latest checkpoint no longer matches current HEADs".to_string(),
                            });
                        }
                    }
                    Err(e) => failures.push(DoctorFailure {
                        packet_id: None,
                        error: None,
                        detail: format!("full verification pass could not run: {e}"),
                    }),
                },
                Err(e) => failures.push(DoctorFailure {
                    packet_id: None,
                    error: None,
                    detail: format!("could not open verifier for full mode: {e}"),
                }),
            }
        } else {
            for packet_id in &packet_ids {
                self.check_fast(packet_id, &mut failures)?;
            }
        }

        Ok(DoctorReport {
            ok: failures.is_empty(),
            mode: match mode {
                DoctorMode::Fast => "fast".to_string(),
                DoctorMode::Full => "full".to_string(),
            },
            packet_count: packet_ids.len(),
            commit_count,
            checkpoint_count,
            failures,
        })
    }

    fn check_dcl_config(&self, failures: &mut Vec<DoctorFailure>) {
        match self.config_store.read() {
            Ok(None) => failures.push(DoctorFailure {
                packet_id: None,
                error: None,
                detail: "dcl-config.json is missing; root was never initialized".to_string(),
            }),
            Ok(Some(found)) => {
                let current = DclConfig::current();
                if !current.matches_runtime(&found) {
                    failures.push(DoctorFailure {
                        packet_id: None,
                        error: None,
                        detail: format!(
                            "dcl-config.json disagrees with this runtime: found {found:?}, expected {current:?}"
                        ),
                    });
                }
            }
            Err(e) => failures.push(DoctorFailure {
                packet_id: None,
                error: None,
                detail: format!("could not read dcl-config.json: {e}"),
            }),
        }
    }

    fn recover_journals(&self, failures: &mut Vec<DoctorFailure>) -> VerifyResult<()> {
        for packet_id in self.commit_store.list_packet_ids()? {
            match self.commit_store.recover_packet(&packet_id) {
                Ok(RecoveryOutcome::Clean) => {}
                Ok(outcome) => failures.push(DoctorFailure {
                    packet_id: Some(packet_id.clone()),
                    error: None,
                    detail: format!("journal recovery: {outcome:?}"),
                }),
                Err(e) => failures.push(DoctorFailure {
                    packet_id: Some(packet_id.clone()),
                    error: None,
                    detail: format!("journal recovery failed: {e}"),
                }),
            }
        }
        Ok(())
    }

    fn check_fast(&self, packet_id: &str, failures: &mut Vec<DoctorFailure>) -> VerifyResult<()> {
        let head = self.commit_store.read_head(packet_id)?;
        let last = self
            .commit_store
            .read_all_commits(packet_id)?
            .into_iter()
            .last();

        let head_ok = match (&head, &last) {
            (Some(h), Some(l)) => h.seq == l.seq && h.commit_hash == l.commit_hash,
            (None, None) => true,
            _ => false,
        };
        if !head_ok {
            failures.push(DoctorFailure {
                packet_id: Some(packet_id.to_string()),
                error: Some(VerifyError::ErrHeadDrift {
                    packet_id: packet_id.to_string(),
                }),
                detail: "HEAD does not match the last commit on disk".to_string(),
            });
        }

        if let Some(h) = &head {
            let state_store = StateStore::new(&self.root);
            let doc = state_store.load()?;
            let runtime_hash = doc.packet_post_state_hash(packet_id)?;
            if runtime_hash.as_deref() != Some(h.post_state_hash.as_str()) {
                failures.push(DoctorFailure {
                    packet_id: Some(packet_id.to_string()),
                    error: Some(VerifyError::ErrRuntimeBindingMismatch {
                        packet_id: packet_id.to_string(),
                    }),
                    detail: "runtime state does not bind to HEAD.post_state_hash".to_string(),
                });
            }
        }
        Ok(())
    }
}
