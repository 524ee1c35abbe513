// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Pipeline validation
//!
//! Checks externally supplied pipeline documents against the graph
//! invariants before they are loaded. The in-memory graph never re-checks
//! itself; this is the only place structural problems are reported.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::is_transient_key;
use crate::persist::PersistedPipeline;

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a persisted pipeline
    pub fn validate(pipeline: &PersistedPipeline, transient_prefix: &str) -> ValidationResult {
        let mut result = ValidationResult::new();

        if pipeline.steps.is_empty() {
            result.add_warning("Pipeline has no steps");
        }

        for (id, step) in &pipeline.steps {
            if step.uuid != *id {
                result.add_error(&format!(
                    "Step '{}' is stored under key '{}'",
                    step.uuid, id
                ));
            }

            let mut seen = HashSet::new();
            for source in &step.incoming_connections {
                if source == id {
                    result.add_error(&format!("Step '{}' connects to itself", id));
                } else if !pipeline.steps.contains_key(source) {
                    result.add_error(&format!(
                        "Step '{}' references unknown step '{}'",
                        id, source
                    ));
                }

                if !seen.insert(source) {
                    result.add_warning(&format!(
                        "Step '{}' lists incoming connection '{}' more than once",
                        id, source
                    ));
                }
            }

            let transient: Vec<&str> = step
                .meta_data
                .extra
                .keys()
                .filter(|k| is_transient_key(k, transient_prefix))
                .map(String::as_str)
                .collect();
            if !transient.is_empty() {
                result.add_warning(&format!(
                    "Step '{}' has editor-only metadata that will be dropped: {}",
                    id,
                    transient.join(", ")
                ));
            }
        }

        for cycle in Self::find_cycles(pipeline) {
            result.add_error(&format!("Circular dependency: {}", cycle.join(" → ")));
        }

        result
    }

    /// Cycles longer than one step, as lists of member ids.
    ///
    /// Self-loops and dangling references are reported separately and left
    /// out of the graph here.
    fn find_cycles(pipeline: &PersistedPipeline) -> Vec<Vec<String>> {
        let mut graph = DiGraph::<&str, ()>::new();
        let nodes: HashMap<&str, _> = pipeline
            .steps
            .keys()
            .map(|id| (id.as_str(), graph.add_node(id.as_str())))
            .collect();

        for (id, step) in &pipeline.steps {
            for source in &step.incoming_connections {
                if source == id {
                    continue;
                }
                if let Some(source_node) = nodes.get(source.as_str()) {
                    graph.update_edge(*source_node, nodes[id.as_str()], ());
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .filter_map(|component| Self::cycle_path(&graph, &component))
            .collect();
        cycles.sort();
        cycles
    }

    /// Shortest closed walk through the smallest member of a strongly
    /// connected component, e.g. `a → c → b → a`
    fn cycle_path(graph: &DiGraph<&str, ()>, component: &[NodeIndex]) -> Option<Vec<String>> {
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = *component.iter().min_by_key(|n| graph[**n])?;

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            let mut next: Vec<NodeIndex> = graph
                .neighbors(node)
                .filter(|n| members.contains(n))
                .collect();
            next.sort_by_key(|n| graph[*n]);

            for child in next {
                if child == start {
                    let mut walk = vec![graph[start].to_string()];
                    let mut cursor = node;
                    while cursor != start {
                        walk.push(graph[cursor].to_string());
                        cursor = *parent.get(&cursor)?;
                    }
                    walk[1..].reverse();
                    walk.push(graph[start].to_string());
                    return Some(walk);
                }

                if !parent.contains_key(&child) {
                    parent.insert(child, node);
                    queue.push_back(child);
                }
            }
        }

        None
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TRANSIENT_PREFIX;

    fn pipeline(json: &str) -> PersistedPipeline {
        PersistedPipeline::from_json(json).unwrap()
    }

    #[test]
    fn test_valid_pipeline() {
        let p = pipeline(
            r#"{"name": "ok", "uuid": "1", "steps": {
                "a": {"uuid": "a"},
                "b": {"uuid": "b", "incoming_connections": ["a"]}
            }}"#,
        );

        let result = PipelineValidator::validate(&p, TRANSIENT_PREFIX);
        assert!(result.is_valid());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_empty_pipeline_warns() {
        let result = PipelineValidator::validate(&pipeline(r#"{"name": "e", "uuid": "e"}"#), "_");

        assert!(result.is_valid());
        assert!(result.warnings[0].contains("no steps"));
    }

    #[test]
    fn test_self_loop_and_dangling() {
        let p = pipeline(
            r#"{"name": "bad", "uuid": "1", "steps": {
                "a": {"uuid": "a", "incoming_connections": ["a", "ghost"]}
            }}"#,
        );

        let result = PipelineValidator::validate(&p, TRANSIENT_PREFIX);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("connects to itself")));
        assert!(result.errors.iter().any(|e| e.contains("unknown step 'ghost'")));
    }

    #[test]
    fn test_cycle_reported() {
        let p = pipeline(
            r#"{"name": "loop", "uuid": "1", "steps": {
                "a": {"uuid": "a", "incoming_connections": ["c"]},
                "b": {"uuid": "b", "incoming_connections": ["a"]},
                "c": {"uuid": "c", "incoming_connections": ["b"]},
                "d": {"uuid": "d", "incoming_connections": ["a"]}
            }}"#,
        );

        let result = PipelineValidator::validate(&p, TRANSIENT_PREFIX);
        assert_eq!(result.errors, vec!["Circular dependency: a → b → c → a"]);
    }

    #[test]
    fn test_cycle_follows_real_edges() {
        let p = pipeline(
            r#"{"name": "loop", "uuid": "1", "steps": {
                "a": {"uuid": "a", "incoming_connections": ["b"]},
                "b": {"uuid": "b", "incoming_connections": ["c"]},
                "c": {"uuid": "c", "incoming_connections": ["a"]}
            }}"#,
        );

        let result = PipelineValidator::validate(&p, TRANSIENT_PREFIX);
        assert_eq!(result.errors, vec!["Circular dependency: a → c → b → a"]);
    }

    #[test]
    fn test_key_mismatch_and_warnings() {
        let p = pipeline(
            r#"{"name": "w", "uuid": "1", "steps": {
                "a": {"uuid": "a"},
                "b": {"uuid": "x", "incoming_connections": ["a", "a"],
                      "meta_data": {"position": [0, 0], "_dragged": true}}
            }}"#,
        );

        let result = PipelineValidator::validate(&p, TRANSIENT_PREFIX);
        assert!(result.errors.iter().any(|e| e.contains("stored under key 'b'")));
        assert!(result.warnings.iter().any(|w| w.contains("more than once")));
        assert!(result.warnings.iter().any(|w| w.contains("_dragged")));
    }
}
