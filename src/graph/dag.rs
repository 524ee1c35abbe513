// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Read-only petgraph view of a step graph
//!
//! Used for ordering and export: topological execution order, transitive
//! dependency queries, and text/DOT/Mermaid renderings.

use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::errors::StepgraphError;
use crate::graph::PipelineGraph;

/// Step dependency DAG built from committed connections
pub struct DagView {
    graph: DiGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
    titles: HashMap<String, String>,
}

impl DagView {
    /// Build a DAG view of a step graph
    pub fn build(pipeline: &PipelineGraph) -> Result<Self, StepgraphError> {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();
        let mut titles = HashMap::new();

        for step in pipeline.steps() {
            let node = graph.add_node(step.id.clone());
            id_to_index.insert(step.id.clone(), node);
            titles.insert(step.id.clone(), step.title.clone());
        }

        for (source, target) in pipeline.connections() {
            let source_node = id_to_index
                .get(source)
                .ok_or_else(|| StepgraphError::StepNotFound { step: source.to_string() })?;
            let target_node = id_to_index[target];

            graph.update_edge(*source_node, target_node, ());
        }

        Ok(Self {
            graph,
            id_to_index,
            titles,
        })
    }

    /// Members of the first strongly connected component that contains a cycle
    fn cycle_members(&self) -> Vec<String> {
        tarjan_scc(&self.graph)
            .into_iter()
            .find(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|n| self.graph.contains_edge(*n, *n))
            })
            .map(|component| component.into_iter().map(|n| self.graph[n].clone()).collect())
            .unwrap_or_default()
    }

    /// Step ids in a valid execution order
    pub fn topological_order(&self) -> Result<Vec<String>, StepgraphError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|_| {
                let path = self.cycle_members();
                let source_step = path.last().cloned().unwrap_or_default();
                let target = path.first().cloned().unwrap_or_default();
                StepgraphError::CircularDependency {
                    source_step,
                    target,
                    path,
                }
            })
    }

    /// Direct predecessors of a step
    pub fn dependencies(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, petgraph::Direction::Incoming)
    }

    /// Direct successors of a step
    pub fn dependents(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, id: &str, direction: petgraph::Direction) -> Option<Vec<String>> {
        let node = self.id_to_index.get(id)?;
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        ids.sort();
        Some(ids)
    }

    /// Check if step `a` depends (directly or transitively) on step `b`
    pub fn depends_on(&self, a: &str, b: &str) -> bool {
        let (Some(node_a), Some(node_b)) = (self.id_to_index.get(a), self.id_to_index.get(b)) else {
            return false;
        };

        has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    fn title<'a>(&'a self, id: &'a str) -> &'a str {
        match self.titles.get(id).map(String::as_str) {
            Some(title) if !title.is_empty() => title,
            _ => id,
        }
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let id = &self.graph[node];
            out.push_str(&format!("    {}[\"{}\"]\n", id, self.title(id)));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    {} --> {}\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in self.graph.node_indices() {
            let id = &self.graph[node];
            out.push_str(&format!("    \"{}\" [label=\"{}\"];\n", id, self.title(id)));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self) -> Result<String, StepgraphError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, id) in order.iter().enumerate() {
            let deps = self.dependencies(id).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, self.title(id), id));

            if !deps.is_empty() {
                out.push_str(&format!(" [after: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}
