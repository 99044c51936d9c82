//! The operator command surface (spec §6): one `clap` subcommand per
//! Lifecycle Engine operation plus the Verifier/Doctor/inspection commands.
//!
//! Grounded on `toka-cli::Cli`/`Commands`'s `#[derive(Parser)]` shape and
//! `toka-runtime::cli::Commands::Event`'s JSON-blob argument convention:
//! structured bodies (`PreflightAssessment`, `ReviewAssessment`,
//! `HeartbeatPayload`) are taken as a single `--assessment`/`--payload` JSON
//! string rather than exploded into one flag per field.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Operator command-line surface for govctl.
#[derive(Debug, Parser)]
#[command(name = "govctl", version, about = "Command-line governance control plane for packet-based delivery")]
pub struct Cli {
    /// Governance root directory, overriding `GOVCTL_ROOT`.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log verbosity (`error`, `warn`, `info`, `debug`, `trace`), overriding `RUST_LOG`.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Every operator command (spec §6).
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a governance root: validate and write `definition.json`,
    /// ensure `constitution.txt` exists, write the DCL config lock.
    Init {
        /// Path to a definition document to validate and install.
        definition_path: PathBuf,
    },

    /// List packets ready to be claimed right now.
    Ready,

    /// Dump full status: every packet's runtime state plus the effective
    /// configuration. With a packet id, dump just that packet.
    Status {
        /// Packet to report on; omit for every packet.
        packet_id: Option<String>,
    },

    /// Claim a ready packet.
    Claim {
        /// Packet to claim.
        packet_id: String,
        /// Executor claiming the packet.
        actor: String,
        /// Context manifest files attested as read, comma-separated.
        #[arg(long = "context-attestation", value_delimiter = ',')]
        context_attestation: Vec<String>,
    },

    /// Submit a mandatory preflight assessment.
    Preflight {
        /// Packet under preflight.
        packet_id: String,
        /// Executor submitting the assessment.
        actor: String,
        /// `PreflightAssessment`, as a JSON object.
        #[arg(long)]
        assessment: String,
    },

    /// Supervisor approval clearing a packet from preflight into execution.
    PreflightApprove {
        /// Packet to approve.
        packet_id: String,
        /// Approving supervisor.
        actor: String,
    },

    /// Supervisor (or automatic timeout) return of a preflight assessment
    /// for revision.
    PreflightReturn {
        /// Packet to return.
        packet_id: String,
        /// Actor issuing the return.
        actor: String,
        /// Reason for the return.
        reason: String,
    },

    /// Executor liveness signal.
    Heartbeat {
        /// Packet reporting in.
        packet_id: String,
        /// Assigned executor.
        actor: String,
        /// `HeartbeatPayload`, as a JSON object.
        #[arg(long)]
        payload: String,
    },

    /// Run the staleness sweep over every packet with an open chain,
    /// stalling any `in_progress` packet with a lapsed heartbeat and
    /// returning any `preflight` packet whose review window has expired.
    CheckStalled,

    /// Executor declares the packet complete.
    Done {
        /// Packet to complete.
        packet_id: String,
        /// Assigned executor.
        actor: String,
        /// Evidence narrative.
        evidence: String,
        /// `ResidualRiskAck`, as a JSON value (`"none"` or
        /// `{"declared":{"description":...,"severity":...}}`). Defaults to
        /// `"none"` if omitted.
        #[arg(long)]
        risk_ack: Option<String>,
    },

    /// A reviewer other than the executor takes ownership of the review.
    ReviewClaim {
        /// Packet under review.
        packet_id: String,
        /// Reviewer claiming it.
        actor: String,
    },

    /// The claiming reviewer records a verdict.
    ReviewSubmit {
        /// Packet under review.
        packet_id: String,
        /// Claiming reviewer.
        actor: String,
        /// `approve`, `reject`, or `escalate`.
        verdict: String,
        /// `ReviewAssessment`, as a JSON object.
        #[arg(long)]
        assessment: String,
    },

    /// Halt a packet for cause.
    Fail {
        /// Packet to fail.
        packet_id: String,
        /// Actor issuing the failure.
        actor: String,
        /// Reason for the failure.
        reason: String,
        /// Attest that `actor` holds the supervisor role. Without this,
        /// `actor` must be the packet's assigned executor.
        #[arg(long)]
        supervisor: bool,
    },

    /// Supervisor-only return of a terminal-except-reset packet to
    /// `pending`. Running this command attests the caller holds the
    /// supervisor role.
    Reset {
        /// Packet to reset.
        packet_id: String,
        /// Supervisor performing the reset.
        supervisor: String,
        /// Reason for the reset.
        reason: String,
    },

    /// Append a free-form narrative entry without changing status.
    Note {
        /// Packet to annotate.
        packet_id: String,
        /// Actor leaving the note.
        actor: String,
        /// Note text.
        text: String,
    },

    /// Area-wide closeout checkpoint: requires every packet in the area to
    /// be `done`.
    CloseoutL2 {
        /// Area to close out.
        area_id: String,
        /// Supervisor performing the closeout.
        supervisor: String,
        /// Path to a written closeout assessment, checked for existence and
        /// embedded in the report; not interpreted by the Lifecycle Engine.
        assessment_path: PathBuf,
        /// Optional closeout notes.
        notes: Option<String>,
    },

    /// Verify one packet's commit chain, or every known packet with `--all`.
    Verify {
        /// Packet to verify; omitted when `--all` is given.
        packet_id: Option<String>,
        /// Verify every packet with a chain instead of one.
        #[arg(long)]
        all: bool,
    },

    /// Print the ordered commit history for one packet.
    History {
        /// Packet whose history to print.
        packet_id: String,
    },

    /// Export a sealed, self-contained proof manifest for one packet.
    ExportProof {
        /// Packet to export.
        packet_id: String,
        /// File to write the manifest to, instead of stdout's report envelope.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run the Integrity Runtime: journal recovery plus fast or full
    /// verification.
    Doctor {
        /// Recompute and verify every commit chain instead of the fast
        /// HEAD/binding check.
        #[arg(long)]
        full: bool,
    },

    /// Print the last `n` lifecycle log entries (default 20).
    Log {
        /// Number of trailing entries to print.
        n: Option<usize>,
    },
}
