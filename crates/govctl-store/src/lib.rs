#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-store** – the persistence substrate for govctl: OS-advisory
//! locks and atomic file replacement (§4.C), the DCL commit store (§4.D),
//! the state store (§4.E), project checkpoints, and the lifecycle log
//! (§4.K).
//!
//! Nothing in this crate decides *whether* a transition is legal — that is
//! `govctl-kernel`'s job. This crate only guarantees that whatever the
//! kernel decides to write either lands completely or not at all.

mod atomic;
mod checkpoint_store;
mod commit_store;
mod dcl_config;
mod error;
mod lifecycle_log;
mod risk_register;
mod state_store;

pub use atomic::{atomic_write, LockGuard};
pub use checkpoint_store::CheckpointStore;
pub use commit_store::{compute_commit_hash, CommitStore, RecoveryOutcome};
pub use dcl_config::{DclConfig, DclConfigStore, CANONICALIZATION_VERSION, DCL_VERSION};
pub use error::{StoreError, StoreResult};
pub use lifecycle_log::LifecycleLog;
pub use risk_register::RiskRegisterStore;
pub use state_store::{StateDocument, StateStore, STATE_SCHEMA_VERSION};
