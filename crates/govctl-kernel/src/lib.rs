#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-kernel** – the Lifecycle Engine (spec §4.H): the packet status
//! transition table, the eleven operator operations, and the stable
//! [`GovernanceError`] surface every higher layer (`govctl-verify`,
//! `govctl-config`, `govctl-cli`) builds on.
//!
//! This crate decides *whether* a transition is legal and what it costs
//! (dependency propagation, residual risk, review cycles); `govctl-store`
//! decides only *how* a decided write lands durably.

mod config;
mod diff;
mod engine;
mod error;

pub use config::{
    EngineConfig, DEFAULT_HEARTBEAT_INTERVAL_SECONDS, DEFAULT_MAX_REVIEW_CYCLES, DEFAULT_PREFLIGHT_TIMEOUT_SECONDS,
};
pub use engine::Engine;
pub use error::{GovernanceError, GovernanceResult, InvalidTransitionReason};
