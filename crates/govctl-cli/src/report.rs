//! The structured result envelope every operator command returns (spec
//! §4.L, §7): `{ok, code, message, state_snapshot?}`. Serialized with the
//! canonical serializer so two runs against the same state produce
//! byte-identical output, not just equivalent JSON.

use govctl_types::PacketRuntimeState;
use serde::Serialize;

/// The envelope printed (as canonical JSON) to stdout for every `govctl`
/// invocation, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct GovernanceReport {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Stable machine-readable code: `"ok"` on success, otherwise
    /// [`govctl_kernel::GovernanceError::code`] or a verify/doctor code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// The affected packet's runtime state after the call, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_snapshot: Option<PacketRuntimeState>,
    /// Arbitrary command-specific payload (a list of ready packets, a
    /// commit chain, a proof manifest, a doctor report, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl GovernanceReport {
    /// A bare success with no extra payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            code: "ok".to_string(),
            message: message.into(),
            state_snapshot: None,
            data: None,
        }
    }

    /// A success carrying the packet's post-transition runtime state.
    pub fn ok_with_state(message: impl Into<String>, state_snapshot: Option<PacketRuntimeState>) -> Self {
        Self {
            ok: true,
            code: "ok".to_string(),
            message: message.into(),
            state_snapshot,
            data: None,
        }
    }

    /// A success carrying an arbitrary JSON payload (`ready`, `history`,
    /// `export-proof`, `doctor`, ...).
    pub fn ok_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            ok: true,
            code: "ok".to_string(),
            message: message.into(),
            state_snapshot: None,
            data: Some(data),
        }
    }

    /// A failure with a stable machine code and human message.
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            state_snapshot: None,
            data: None,
        }
    }

    /// Attach an extra data payload to an already-built report (e.g. a
    /// commit's seq/hash alongside the state snapshot it produced).
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Print this report to stdout as canonical JSON (one line, stable key
    /// ordering — the canonical serializer, not `serde_json`'s default
    /// map order, so CLI output is diffable run to run).
    pub fn print(&self) {
        match govctl_canon::canonical_bytes(self) {
            Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            Err(_) => println!("{}", serde_json::to_string(self).unwrap_or_default()),
        }
    }
}
