#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **govctl-gate** – Dependency Gate (spec §4.G): readiness, blocked
//! propagation, and the `(area_id, wbs_ref)` tie-break used by `ready` and
//! `status`. Load-time cycle detection here is also reused by
//! `govctl-defs`, which is the only place the spec requires a cycle to be
//! rejected outright (§4.F).

use std::collections::{BTreeMap, HashMap, HashSet};

use govctl_types::{PacketDefinition, PacketId, PacketRuntimeState, PacketStatus};

/// Errors raised while building or querying a dependency graph.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    /// A packet's `dependencies` list names an id with no definition.
    #[error("packet '{packet}' depends on unknown packet '{dependency}'")]
    UnknownDependency {
        /// The packet whose dependency list is invalid.
        packet: PacketId,
        /// The unresolvable dependency id.
        dependency: PacketId,
    },
    /// A cycle was found in the dependency DAG.
    #[error("dependency cycle detected: {0:?}")]
    CycleDetected(Vec<PacketId>),
}

/// An indexed, cycle-free dependency graph over a set of packet
/// definitions. Built once at load time and treated as read-only
/// afterwards, same posture as the definitions themselves.
#[derive(Debug, Clone)]
pub struct DependencyIndex {
    deps_of: HashMap<PacketId, Vec<PacketId>>,
    dependents_of: HashMap<PacketId, Vec<PacketId>>,
    /// `(area_id, wbs_ref)` per packet, cached for the tie-break ordering.
    order_key: HashMap<PacketId, (String, String)>,
}

impl DependencyIndex {
    /// Build the graph from a full set of packet definitions, validating
    /// that every dependency resolves and that the graph is acyclic.
    pub fn build(definitions: &[PacketDefinition]) -> Result<Self, GateError> {
        let known: HashSet<&str> = definitions.iter().map(|d| d.id.as_str()).collect();

        let mut deps_of: HashMap<PacketId, Vec<PacketId>> = HashMap::new();
        let mut dependents_of: HashMap<PacketId, Vec<PacketId>> = HashMap::new();
        let mut order_key = HashMap::new();

        for def in definitions {
            deps_of.entry(def.id.clone()).or_default();
            dependents_of.entry(def.id.clone()).or_default();
            order_key.insert(def.id.clone(), (def.area_id.clone(), def.wbs_ref.clone()));

            for dep in &def.dependencies {
                if !known.contains(dep.as_str()) {
                    return Err(GateError::UnknownDependency {
                        packet: def.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                deps_of.entry(def.id.clone()).or_default().push(dep.clone());
                dependents_of.entry(dep.clone()).or_default().push(def.id.clone());
            }
        }

        let graph = Self {
            deps_of,
            dependents_of,
            order_key,
        };
        graph.detect_cycle()?;
        Ok(graph)
    }

    fn detect_cycle(&self) -> Result<(), GateError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<PacketId> = Vec::new();

        fn visit<'a>(
            node: &'a str,
            deps_of: &'a HashMap<PacketId, Vec<PacketId>>,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<PacketId>,
        ) -> Result<(), GateError> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let mut cycle = path.clone();
                    cycle.push(node.to_string());
                    return Err(GateError::CycleDetected(cycle));
                }
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            path.push(node.to_string());
            if let Some(deps) = deps_of.get(node) {
                for dep in deps {
                    visit(dep, deps_of, marks, path)?;
                }
            }
            path.pop();
            marks.insert(node, Mark::Done);
            Ok(())
        }

        let mut ids: Vec<&str> = self.deps_of.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        for id in ids {
            visit(id, &self.deps_of, &mut marks, &mut path)?;
        }
        Ok(())
    }

    /// Direct dependencies of `packet_id`, empty slice if none or unknown.
    pub fn dependencies_of(&self, packet_id: &str) -> &[PacketId] {
        self.deps_of.get(packet_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependents of `packet_id` (packets that list it as a
    /// dependency), empty slice if none or unknown.
    pub fn dependents_of(&self, packet_id: &str) -> &[PacketId] {
        self.dependents_of.get(packet_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn status_of(states: &BTreeMap<PacketId, PacketRuntimeState>, packet_id: &str) -> PacketStatus {
        states
            .get(packet_id)
            .map(|s| s.status)
            .unwrap_or(PacketStatus::Pending)
    }

    /// A packet is ready iff its own status is `pending` and every
    /// dependency's status is `done` (spec §4.G).
    pub fn is_ready(&self, packet_id: &str, states: &BTreeMap<PacketId, PacketRuntimeState>) -> bool {
        if Self::status_of(states, packet_id) != PacketStatus::Pending {
            return false;
        }
        self.dependencies_of(packet_id)
            .iter()
            .all(|dep| Self::status_of(states, dep) == PacketStatus::Done)
    }

    /// List every ready packet id, ordered strictly by `(area_id, wbs_ref)`
    /// ascending (spec §4.G tie-break; ids are never used for ordering).
    pub fn ready_ids(&self, states: &BTreeMap<PacketId, PacketRuntimeState>) -> Vec<PacketId> {
        let mut ready: Vec<&PacketId> = self
            .order_key
            .keys()
            .filter(|id| self.is_ready(id, states))
            .collect();
        ready.sort_by(|a, b| self.order_key[*a].cmp(&self.order_key[*b]));
        ready.into_iter().cloned().collect()
    }

    /// Recompute blocked/pending status for every non-terminal packet whose
    /// current status is `pending` or `blocked`: a packet becomes `blocked`
    /// if any dependency is `failed` or (transitively, via this same
    /// recomputation) `blocked`, and returns to `pending` once none of its
    /// dependencies are in either state.
    ///
    /// Returns the ids whose status actually changed, so callers can emit
    /// the corresponding log entries / commits. Idempotent: calling this
    /// again with no intervening transition returns an empty vector.
    pub fn recompute_propagation(&self, states: &mut BTreeMap<PacketId, PacketRuntimeState>) -> Vec<PacketId> {
        let mut changed = Vec::new();
        // Propagation needs to settle transitively (X failed -> Y blocked ->
        // Z blocked), so iterate to a fixed point. The graph is acyclic and
        // finite, so this always terminates.
        loop {
            let mut round_changed = Vec::new();
            let mut ids: Vec<&PacketId> = self.deps_of.keys().collect();
            ids.sort();
            for id in ids {
                let current = Self::status_of(states, id);
                if current != PacketStatus::Pending && current != PacketStatus::Blocked {
                    continue;
                }
                let should_block = self.dependencies_of(id).iter().any(|dep| {
                    matches!(
                        Self::status_of(states, dep),
                        PacketStatus::Failed | PacketStatus::Blocked
                    )
                });
                let new_status = if should_block {
                    PacketStatus::Blocked
                } else {
                    PacketStatus::Pending
                };
                if new_status != current {
                    states
                        .entry(id.clone())
                        .or_insert_with(PacketRuntimeState::pending)
                        .status = new_status;
                    round_changed.push(id.clone());
                }
            }
            if round_changed.is_empty() {
                break;
            }
            changed.extend(round_changed);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, area: &str, wbs: &str, deps: &[&str]) -> PacketDefinition {
        PacketDefinition {
            id: id.to_string(),
            wbs_ref: wbs.to_string(),
            area_id: area.to_string(),
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

    fn done_state() -> PacketRuntimeState {
        let mut s = PacketRuntimeState::pending();
        s.status = PacketStatus::Done;
        s
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let defs = vec![def("a", "area1", "1.1", &["missing"])];
        let err = DependencyIndex::build(&defs).unwrap_err();
        assert_eq!(
            err,
            GateError::UnknownDependency {
                packet: "a".to_string(),
                dependency: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let defs = vec![def("a", "area1", "1.1", &["b"]), def("b", "area1", "1.2", &["a"])];
        assert!(matches!(
            DependencyIndex::build(&defs),
            Err(GateError::CycleDetected(_))
        ));
    }

    #[test]
    fn test_ready_requires_deps_done() {
        let defs = vec![def("a", "area1", "1.1", &[]), def("b", "area1", "1.2", &["a"])];
        let graph = DependencyIndex::build(&defs).unwrap();
        let states = BTreeMap::new();

        assert!(graph.is_ready("a", &states));
        assert!(!graph.is_ready("b", &states));
    }

    #[test]
    fn test_ready_ids_tie_break_by_area_then_wbs() {
        let defs = vec![
            def("z", "area2", "1.1", &[]),
            def("a", "area1", "2.1", &[]),
            def("m", "area1", "1.1", &[]),
        ];
        let graph = DependencyIndex::build(&defs).unwrap();
        let states = BTreeMap::new();
        assert_eq!(graph.ready_ids(&states), vec!["m", "a", "z"]);
    }

    #[test]
    fn test_blocked_propagation_from_failed_dependency() {
        let defs = vec![
            def("x", "area1", "1.1", &[]),
            def("y", "area1", "1.2", &["x"]),
            def("z", "area1", "1.3", &["y"]),
        ];
        let graph = DependencyIndex::build(&defs).unwrap();
        let mut states = BTreeMap::new();
        let mut x = PacketRuntimeState::pending();
        x.status = PacketStatus::Failed;
        states.insert("x".to_string(), x);

        let changed = graph.recompute_propagation(&mut states);
        assert!(changed.contains(&"y".to_string()));
        assert!(changed.contains(&"z".to_string()));
        assert_eq!(states["y"].status, PacketStatus::Blocked);
        assert_eq!(states["z"].status, PacketStatus::Blocked);
    }

    #[test]
    fn test_blocked_reverts_to_pending_once_dependency_recovers() {
        let defs = vec![def("x", "area1", "1.1", &[]), def("y", "area1", "1.2", &["x"])];
        let graph = DependencyIndex::build(&defs).unwrap();
        let mut states = BTreeMap::new();
        let mut x = PacketRuntimeState::pending();
        x.status = PacketStatus::Failed;
        states.insert("x".to_string(), x);
        graph.recompute_propagation(&mut states);
        assert_eq!(states["y"].status, PacketStatus::Blocked);

        states.get_mut("x").unwrap().status = PacketStatus::Pending;
        let changed = graph.recompute_propagation(&mut states);
        assert!(changed.contains(&"y".to_string()));
        assert_eq!(states["y"].status, PacketStatus::Pending);
    }

    #[test]
    fn test_done_dependency_makes_dependent_ready() {
        let defs = vec![def("a", "area1", "1.1", &[]), def("b", "area1", "1.2", &["a"])];
        let graph = DependencyIndex::build(&defs).unwrap();
        let mut states = BTreeMap::new();
        states.insert("a".to_string(), done_state());
        assert!(graph.is_ready("b", &states));
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let defs = vec![def("x", "area1", "1.1", &[]), def("y", "area1", "1.2", &["x"])];
        let graph = DependencyIndex::build(&defs).unwrap();
        let mut states = BTreeMap::new();
        let mut x = PacketRuntimeState::pending();
        x.status = PacketStatus::Failed;
        states.insert("x".to_string(), x);
        graph.recompute_propagation(&mut states);
        let second = graph.recompute_propagation(&mut states);
        assert!(second.is_empty());
    }
}
