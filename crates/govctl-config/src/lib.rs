#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-config** – environment-driven configuration resolution for
//! govctl (spec §4.L "Environment variables").
//!
//! Grounded on `toka-runtime::RuntimeConfig`'s struct-with-defaults style
//! (a `Default` impl plus a loader that overlays environment variables on
//! top of it) and `toka-llm-gateway::Config`'s env-var-by-name loading
//! convention (read each name, fall back, parse, warn on bad values rather
//! than fail the whole process).

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use govctl_kernel::EngineConfig;
use govctl_verify::Posture;

/// `GOVCTL_ROOT` — governance root directory.
pub const ENV_ROOT: &str = "GOVCTL_ROOT";
/// `GOVCTL_STRICT` — `"1"`/`"true"` enables strict doctor mode at startup.
pub const ENV_STRICT: &str = "GOVCTL_STRICT";
/// `GOVCTL_HEARTBEAT_INTERVAL_SECONDS` — default heartbeat interval override.
pub const ENV_HEARTBEAT_INTERVAL_SECONDS: &str = "GOVCTL_HEARTBEAT_INTERVAL_SECONDS";
/// `GOVCTL_STALL_THRESHOLD_SECONDS` — stall-detection threshold override.
pub const ENV_STALL_THRESHOLD_SECONDS: &str = "GOVCTL_STALL_THRESHOLD_SECONDS";
/// `GOVCTL_PREFLIGHT_TIMEOUT_SECONDS` — preflight auto-return timeout override.
pub const ENV_PREFLIGHT_TIMEOUT_SECONDS: &str = "GOVCTL_PREFLIGHT_TIMEOUT_SECONDS";

/// The fully resolved runtime configuration for a `govctl` process: where
/// the governance root lives, what posture `doctor` runs at startup with,
/// and the timing knobs handed down to the Lifecycle Engine.
///
/// `Serialize`/`Deserialize` so `status`/`doctor` reports can embed the
/// effective configuration verbatim (spec §4.L).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Directory containing `definition.json`, `dcl/`, `constitution.txt`.
    pub root: PathBuf,
    /// Whether a failing startup doctor run should abort (`Strict`) or only
    /// be reported (`FailOpen`).
    #[serde(with = "posture_serde")]
    pub startup_posture: Posture,
    /// Default heartbeat interval, seconds, for packets that don't declare
    /// their own.
    pub heartbeat_interval_default_seconds: u64,
    /// Stall-detection threshold, seconds.
    pub stall_threshold_seconds: u64,
    /// Preflight auto-return timeout, seconds.
    pub preflight_timeout_seconds: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        let engine_defaults = EngineConfig::default();
        Self {
            root: PathBuf::from("."),
            startup_posture: Posture::FailOpen,
            heartbeat_interval_default_seconds: engine_defaults.heartbeat_interval_default_seconds,
            stall_threshold_seconds: engine_defaults.stall_threshold_seconds,
            preflight_timeout_seconds: engine_defaults.preflight_timeout_seconds,
        }
    }
}

impl GovernanceConfig {
    /// Resolve configuration starting from [`Self::default`] and overlaying
    /// whichever `GOVCTL_*` environment variables are set. A variable that
    /// is present but fails to parse is logged and otherwise ignored,
    /// leaving the default (or a previously-resolved override) in place —
    /// a malformed env var should never itself prevent govctl from
    /// starting.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root) = env::var(ENV_ROOT) {
            config.root = PathBuf::from(root);
        }

        if let Ok(strict) = env::var(ENV_STRICT) {
            config.startup_posture = if strict == "1" || strict.eq_ignore_ascii_case("true") {
                Posture::Strict
            } else {
                Posture::FailOpen
            };
        }

        if let Some(heartbeat) = parse_env_u64(ENV_HEARTBEAT_INTERVAL_SECONDS) {
            config.heartbeat_interval_default_seconds = heartbeat;
            // Re-derive the stall threshold unless it's itself overridden below.
            config.stall_threshold_seconds = EngineConfig::default_stall_threshold(heartbeat);
        }

        if let Some(stall) = parse_env_u64(ENV_STALL_THRESHOLD_SECONDS) {
            config.stall_threshold_seconds = stall;
        }

        if let Some(preflight) = parse_env_u64(ENV_PREFLIGHT_TIMEOUT_SECONDS) {
            config.preflight_timeout_seconds = preflight;
        }

        config
    }

    /// The `EngineConfig` the Lifecycle Engine should open with, derived
    /// from this resolved configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            preflight_timeout_seconds: self.preflight_timeout_seconds,
            heartbeat_interval_default_seconds: self.heartbeat_interval_default_seconds,
            stall_threshold_seconds: self.stall_threshold_seconds,
            max_review_cycles: EngineConfig::default().max_review_cycles,
        }
    }
}

fn parse_env_u64(name: &str) -> Option<u64> {
    match env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(var = name, value = %raw, "ignoring non-numeric environment override");
                None
            }
        },
        Err(_) => None,
    }
}

mod posture_serde {
    use govctl_verify::Posture;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(posture: &Posture, serializer: S) -> Result<S::Ok, S::Error> {
        match posture {
            Posture::Strict => "strict",
            Posture::FailOpen => "fail_open",
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Posture, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "strict" => Ok(Posture::Strict),
            "fail_open" => Ok(Posture::FailOpen),
            other => Err(serde::de::Error::unknown_variant(other, &["strict", "fail_open"])),
        }
    }
}
