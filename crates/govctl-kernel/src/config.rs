//! Tunable timing parameters for the Lifecycle Engine (spec §4.H heartbeat
//! and review-cycle rules). `govctl-config` resolves these from environment
//! variables and hands an `EngineConfig` to `Engine::new`; this crate has no
//! opinion on where the numbers came from.

/// Default preflight review timeout, in seconds (spec §4.H.3).
pub const DEFAULT_PREFLIGHT_TIMEOUT_SECONDS: u64 = 3600;
/// Default heartbeat cadence, in seconds, for packets that don't override it.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECONDS: u64 = 900;
/// Default maximum review-reject cycles before forced escalation.
pub const DEFAULT_MAX_REVIEW_CYCLES: u32 = 3;

/// Timing and threshold parameters the Lifecycle Engine consults when
/// deciding whether a packet has stalled or a preflight has timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a packet may sit in `preflight` before it is eligible for
    /// auto-return to the executor (spec §4.H.3).
    pub preflight_timeout_seconds: u64,
    /// Heartbeat cadence used when a packet definition does not declare its
    /// own `heartbeat_interval_seconds`.
    pub heartbeat_interval_default_seconds: u64,
    /// A packet with a missed heartbeat older than this is stalled.
    /// Computed as `max(2 * heartbeat_interval, 1800)` unless overridden.
    pub stall_threshold_seconds: u64,
    /// Review-reject cycles allowed before a packet is forced to `escalated`
    /// instead of looping back to `in_progress` again (spec §4.H.7).
    pub max_review_cycles: u32,
}

impl EngineConfig {
    /// Derive the default stall threshold from a heartbeat interval:
    /// `max(2 * interval, 1800)` seconds.
    pub fn default_stall_threshold(heartbeat_interval_seconds: u64) -> u64 {
        (heartbeat_interval_seconds * 2).max(1800)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let heartbeat = DEFAULT_HEARTBEAT_INTERVAL_SECONDS;
        Self {
            preflight_timeout_seconds: DEFAULT_PREFLIGHT_TIMEOUT_SECONDS,
            heartbeat_interval_default_seconds: heartbeat,
            stall_threshold_seconds: EngineConfig::default_stall_threshold(heartbeat),
            max_review_cycles: DEFAULT_MAX_REVIEW_CYCLES,
        }
    }
}
