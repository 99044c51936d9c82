#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-defs** – Definition Loader (spec §4.F): loads `definition.json`
//! once per process and produces an indexed, read-only in-memory schema.
//! Definitions are never mutated after load; a new definition document
//! requires re-initialization (spec invariant), not a reload API.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use govctl_gate::{DependencyIndex, GateError};
use govctl_types::{AreaId, PacketDefinition, PacketId, WorkArea};
use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating a definition document.
#[derive(Debug, thiserror::Error)]
pub enum DefsError {
    /// The definition file could not be read.
    #[error("io error reading definition file: {0}")]
    Io(#[from] std::io::Error),
    /// The definition file was not well-formed JSON, or was missing a
    /// required field.
    #[error("definition file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed as JSON but failed a schema rule: duplicate
    /// packet ids, an unknown `area_id`, an unknown dependency id, or a
    /// dependency cycle.
    #[error("definition schema invalid: {0}")]
    SchemaInvalid(String),
}

impl From<GateError> for DefsError {
    fn from(e: GateError) -> Self {
        DefsError::SchemaInvalid(e.to_string())
    }
}

/// On-disk shape of `definition.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionDocument {
    /// Work areas declared by this definition.
    pub work_areas: Vec<WorkArea>,
    /// Packet definitions declared by this definition.
    pub packets: Vec<PacketDefinition>,
}

/// An indexed, read-only, validated definition loaded once per process.
#[derive(Debug, Clone)]
pub struct Definitions {
    work_areas: BTreeMap<AreaId, WorkArea>,
    packets: BTreeMap<PacketId, PacketDefinition>,
    dependencies: DependencyIndex,
}

impl Definitions {
    /// Load and validate a definition document from `path`.
    ///
    /// Rejects with [`DefsError::SchemaInvalid`] if: a packet id is
    /// duplicated, a packet's `area_id` names an unknown area, a
    /// dependency names an unknown packet, or the dependency graph
    /// contains a cycle.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefsError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading definition document");
        let bytes = fs::read(path)?;
        let doc: DefinitionDocument = serde_json::from_slice(&bytes)?;
        Self::from_document(doc)
    }

    /// Validate an already-parsed document. Exposed separately from
    /// [`Self::load`] so tests and `govctl-cli init` can construct a
    /// document in memory without round-tripping through a file.
    pub fn from_document(doc: DefinitionDocument) -> Result<Self, DefsError> {
        let mut work_areas = BTreeMap::new();
        for area in doc.work_areas {
            if work_areas.insert(area.id.clone(), area).is_some() {
                return Err(DefsError::SchemaInvalid(
                    "duplicate work area id".to_string(),
                ));
            }
        }

        let mut packets = BTreeMap::new();
        for packet in doc.packets {
            if !work_areas.contains_key(&packet.area_id) {
                return Err(DefsError::SchemaInvalid(format!(
                    "packet '{}' references unknown area '{}'",
                    packet.id, packet.area_id
                )));
            }
            if packets.insert(packet.id.clone(), packet).is_some() {
                return Err(DefsError::SchemaInvalid(
                    "duplicate packet id".to_string(),
                ));
            }
        }

        let definition_list: Vec<PacketDefinition> = packets.values().cloned().collect();
        let dependencies = DependencyIndex::build(&definition_list)?;

        tracing::info!(
            areas = work_areas.len(),
            packets = packets.len(),
            "definition document validated"
        );

        Ok(Self {
            work_areas,
            packets,
            dependencies,
        })
    }

    /// Look up a packet definition by id.
    pub fn packet(&self, id: &str) -> Option<&PacketDefinition> {
        self.packets.get(id)
    }

    /// Look up a work area by id.
    pub fn area(&self, id: &str) -> Option<&WorkArea> {
        self.work_areas.get(id)
    }

    /// All packet definitions, ordered by id.
    pub fn packets(&self) -> impl Iterator<Item = &PacketDefinition> {
        self.packets.values()
    }

    /// All work areas, ordered by id.
    pub fn areas(&self) -> impl Iterator<Item = &WorkArea> {
        self.work_areas.values()
    }

    /// The validated dependency graph, for readiness and propagation
    /// queries (`govctl-gate`).
    pub fn dependency_index(&self) -> &DependencyIndex {
        &self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(id: &str) -> WorkArea {
        WorkArea {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            packets: vec![],
        }
    }

    fn packet(id: &str, area_id: &str, deps: &[&str]) -> PacketDefinition {
        PacketDefinition {
            id: id.to_string(),
            wbs_ref: "1.1".to_string(),
            area_id: area_id.to_string(),
            title: id.to_string(),
            scope: String::new(),
            preconditions: vec![],
            required_actions: vec![],
            required_outputs: vec![],
            validation_checks: vec![],
            exit_criteria: vec![],
            halt_conditions: vec![],
            dependencies: deps.iter().map(|s| s.to_string()).collect(),
            preflight_required: false,
            review_required: false,
            heartbeat_required: false,
            heartbeat_interval_seconds: None,
            context_manifest: vec![],
            template_ref: None,
            ontology_required: false,
        }
    }

    #[test]
    fn test_valid_document_loads() {
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "a1", &[])],
        };
        let defs = Definitions::from_document(doc).unwrap();
        assert!(defs.packet("p1").is_some());
        assert!(defs.area("a1").is_some());
    }

    #[test]
    fn test_duplicate_packet_id_rejected() {
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "a1", &[]), packet("p1", "a1", &[])],
        };
        assert!(matches!(
            Definitions::from_document(doc),
            Err(DefsError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_area_rejected() {
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "missing-area", &[])],
        };
        assert!(matches!(
            Definitions::from_document(doc),
            Err(DefsError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "a1", &["missing"])],
        };
        assert!(matches!(
            Definitions::from_document(doc),
            Err(DefsError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "a1", &["p2"]), packet("p2", "a1", &["p1"])],
        };
        assert!(matches!(
            Definitions::from_document(doc),
            Err(DefsError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definition.json");
        let doc = DefinitionDocument {
            work_areas: vec![area("a1")],
            packets: vec![packet("p1", "a1", &[])],
        };
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        let defs = Definitions::load(&path).unwrap();
        assert!(defs.packet("p1").is_some());
    }
}
