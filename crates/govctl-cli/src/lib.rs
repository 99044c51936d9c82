#![forbid(unsafe_code)]

//! **govctl-cli** – command-line governance control plane for packet-based
//! delivery: claim, preflight, heartbeat, review, and closeout operations
//! over a Deterministic Commitment Layer, plus its Verifier and Integrity
//! Runtime.
//!
//! Split into a library and a thin binary so integration tests can drive
//! [`commands::dispatch`] directly against a temporary governance root
//! without shelling out to the compiled binary.

pub mod cli;
pub mod commands;
pub mod report;
