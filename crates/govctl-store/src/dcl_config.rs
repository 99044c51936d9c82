//! DCL config lock (spec §4.J): `<root>/dcl/dcl-config.json`, written once
//! at `init` and checked at every process start / `doctor` run. The loader
//! refuses to start if this document is missing or disagrees with the
//! runtime's own notion of hash algorithm and schema version.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::atomic::atomic_write;
use crate::error::StoreResult;
use crate::state_store::STATE_SCHEMA_VERSION;

/// Current canonicalization/DCL format versions this build writes and
/// expects. Bumped only on a breaking change to §4.A/§4.D's on-disk shape.
pub const CANONICALIZATION_VERSION: &str = "1.0";
/// See [`CANONICALIZATION_VERSION`].
pub const DCL_VERSION: &str = "1.0";

/// The DCL config lock document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DclConfig {
    /// Always `"dcl"`; a marker distinguishing this from other lock kinds.
    pub mode: String,
    /// Hash algorithm every commit/checkpoint/constitution hash uses.
    pub hash_algorithm: String,
    /// Version of the canonical serialization rules (§4.A) in effect.
    pub canonicalization_version: String,
    /// Version of the commit-store write protocol (§4.D) in effect.
    pub dcl_version: String,
    /// `state.json` schema version this root was initialized with.
    pub state_schema_version: u32,
}

impl DclConfig {
    /// The lock document this build of `govctl` would write at `init` time.
    pub fn current() -> Self {
        Self {
            mode: "dcl".to_string(),
            hash_algorithm: "sha256".to_string(),
            canonicalization_version: CANONICALIZATION_VERSION.to_string(),
            dcl_version: DCL_VERSION.to_string(),
            state_schema_version: STATE_SCHEMA_VERSION,
        }
    }

    /// `true` if `other` is compatible with the runtime currently reading
    /// it (spec §4.J: "disagrees with the in-use runtime" refuses startup).
    pub fn matches_runtime(&self, other: &DclConfig) -> bool {
        self == other
    }
}

/// Persistence for the single [`DclConfig`] lock document.
pub struct DclConfigStore {
    path: PathBuf,
}

impl DclConfigStore {
    /// `root` is the governance root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join("dcl").join("dcl-config.json"),
        }
    }

    /// Write the lock document, overwriting any previous one. Only ever
    /// called by `init`; a running root's lock is never rewritten in place.
    pub fn write(&self, config: &DclConfig) -> StoreResult<()> {
        atomic_write(&self.path, &serde_json::to_vec_pretty(config)?)?;
        Ok(())
    }

    /// Read the lock document, `None` if `init` was never run against this
    /// root.
    pub fn read(&self) -> StoreResult<Option<DclConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&fs::read(&self.path)?)?))
    }
}
